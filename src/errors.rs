//! Unified error types for the bot.
//!
//! Handlers and core operations return [`Result`]; user-input problems surface as
//! [`Error::InvalidArgument`], storage problems as [`Error::Database`] or
//! [`Error::NoRowsAffected`], and chat API failures as [`Error::Discord`].

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Any error reported by the storage engine
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A delete or update matched nothing
    #[error("No rows affected: {what}")]
    NoRowsAffected {
        /// Description of the row that was expected to exist
        what: String,
    },

    /// A command argument or creation parameter was rejected
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// User-facing explanation
        message: String,
    },

    /// The guild already holds the maximum number of mine sets
    #[error("Mine quota exceeded: a guild may hold at most {limit} mine sets")]
    MineQuotaExceeded {
        /// Configured per-guild limit
        limit: u64,
    },

    /// A chat API call failed
    #[error("Discord error: {0}")]
    Discord(Box<poise::serenity_prelude::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Discord(Box::new(value))
    }
}

impl Error {
    /// Shorthand for an [`Error::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
