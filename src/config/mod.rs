pub mod env;
mod loader;

pub use env::{
    AppConfig, ConfigError, DirectoryConfig, FetchConfig, LiveConfig, LoggingConfig, RunMode,
};
pub use loader::load_config;
