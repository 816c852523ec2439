pub mod message;
pub mod raw;

pub use message::{MessageBatch, MessageData, ScraperOptions};
pub use raw::{ChannelInfo, PhotoSizeKind, RawMedia, RawMessage, RawPhotoSize};
