use std::{env, path::PathBuf, time::Duration};

use super::env::{
    AppConfig, ConfigError, DirectoryConfig, FetchConfig, LiveConfig, LoggingConfig, RunMode,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let target_channel = env::var("TARGET_CHANNEL")
            .ok()
            .map(|v| v.trim().trim_start_matches('@').to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("TARGET_CHANNEL"))?;

        let mode = match env::var("RUN_MODE") {
            Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "RUN_MODE",
                value,
            })?,
            Err(_) => RunMode::Once,
        };

        let output_file = env::var("OUTPUT_FILE")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let fetch = FetchConfig {
            limit: parse_number("FETCH_LIMIT").unwrap_or(100),
        };

        let live = LiveConfig {
            flush_threshold: parse_number("LIVE_FLUSH_THRESHOLD").unwrap_or(10),
            flush_interval: Duration::from_secs(
                parse_number("LIVE_FLUSH_INTERVAL_SECS").unwrap_or(60),
            ),
        };

        Ok(Self {
            telegram_bot_token,
            target_channel,
            mode,
            output_file,
            directories,
            logging,
            fetch,
            live,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.parse::<T>().ok())
}
