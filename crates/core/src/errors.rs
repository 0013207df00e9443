//! Error types

use thiserror::Error;

use crate::Instrument;

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Stream feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Connection to {instrument} failed after {attempts} attempt(s): {reason}")]
    ConnectionFailed {
        instrument: Instrument,
        attempts: u32,
        reason: String,
    },

    #[error("Read from {instrument} stream failed: {reason}")]
    ReadFailed { instrument: Instrument, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::InvalidMessage(e.to_string())
    }
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
pub type FeedResult<T> = Result<T, FeedError>;
