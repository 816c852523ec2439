use std::{path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    /// Public channel identifier, stored without the leading `@`.
    pub target_channel: String,
    pub mode: RunMode,
    /// When set, the single-shot run also writes the raw record array
    /// here for a host process.
    pub output_file: Option<PathBuf>,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub fetch: FetchConfig,
    pub live: LiveConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Fetch one batch, save it, exit.
    Once,
    /// Fetch an initial batch, then stream new messages until shutdown.
    Live,
}

impl FromStr for RunMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "live" => Ok(Self::Live),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub limit: usize,
}

#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub flush_threshold: usize,
    pub flush_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_mode_parses_case_insensitively() {
        assert_eq!("once".parse::<RunMode>(), Ok(RunMode::Once));
        assert_eq!("LIVE".parse::<RunMode>(), Ok(RunMode::Live));
        assert!("daemon".parse::<RunMode>().is_err());
    }
}
