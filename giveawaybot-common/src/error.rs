// ================================================================
// File: giveawaybot-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

/// Failures of the giveaway lifecycle. The command layer turns every variant
/// into a chat reply; none of them are fatal to the process.
#[derive(Debug, Error)]
pub enum GiveawayError {
    #[error("giveaway '{0}' is already open")]
    AlreadyOpen(String),

    #[error("no giveaway is open")]
    NoActiveGiveaway,

    #[error("not enough watch time: required {required}, have {actual}")]
    Ineligible { required: i64, actual: i64 },

    #[error("already entered giveaway '{0}'")]
    AlreadyEntered(String),

    #[error("no participants in giveaway '{0}'")]
    NoParticipants(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] Error),
}
