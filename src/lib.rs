//! Telegram channel scraper: fetches messages from a single channel,
//! normalizes each into a flat record schema, persists batches as JSON
//! files, and can stream newly arriving messages through the same path.

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod scraper;
pub mod storage;
pub mod telegram;
pub mod transport;
