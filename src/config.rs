//! Configuration — read from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token.
    pub bot_token: String,
    /// SQLite database path.
    pub db_path: PathBuf,
    /// Long-poll timeout passed to getUpdates.
    pub poll_timeout_secs: u64,
    /// Abandoned conversations are evicted after this idle duration.
    pub session_ttl: Duration,
}

impl BotConfig {
    /// Load from the environment. Only the token is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".to_string()))?;

        let db_path = std::env::var("PROFILE_BOT_DB_PATH")
            .unwrap_or_else(|_| "./data/profiles.db".to_string())
            .into();

        let poll_timeout_secs = env_u64("PROFILE_BOT_POLL_TIMEOUT_SECS", 30)?;
        let ttl_min = env_u64("PROFILE_BOT_SESSION_TTL_MIN", 60)?;

        Ok(Self {
            bot_token,
            db_path,
            poll_timeout_secs,
            session_ttl: Duration::from_secs(ttl_min * 60),
        })
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected an integer, got {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}
