//! Error types for chatwrapped-core

use thiserror::Error;

/// Main error type for the chatwrapped-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parse error for a conversation export file
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown aggregation period requested by a caller.
    ///
    /// This is a programming error, not a data condition: callers must pass
    /// one of `hour`, `day`, `week`, `month`, or `year`.
    #[error("invalid period: {0} (use 'hour', 'day', 'week', 'month', or 'year')")]
    InvalidPeriod(String),
}

/// Result type alias for chatwrapped-core
pub type Result<T> = std::result::Result<T, Error>;
