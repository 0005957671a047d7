//! Error types for profile-bot.

use crate::registration::model::{IncompleteDraft, Language};

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Profile store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    Open(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Query(e.to_string())
    }
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Registration flow errors.
///
/// Out-of-sequence and invalid inputs are not errors — the flow answers them
/// with `FlowReply::Ignored` or a localized re-prompt. Only failures that
/// abort a completion attempt surface here.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// The store rejected the completed profile. The session stays in
    /// `AwaitingPhoto` with the draft intact so the user can retry; `lang`
    /// lets the caller localize the failure message.
    #[error("Profile save failed for user {user_id}: {source}")]
    Persistence {
        user_id: i64,
        lang: Language,
        #[source]
        source: StoreError,
    },

    /// A finalize attempt found a missing field. The linear flow fills every
    /// field before `AwaitingPhoto`, so this indicates a controller bug.
    #[error("Assembled profile was incomplete: {0}")]
    Incomplete(#[from] IncompleteDraft),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
