//! Domain-level error types for taxinomos-server.
//!
//! All errors are typed with `thiserror`. Exhaustion of the domain list is a
//! distinct variant so callers never mistake it for an I/O failure.

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Every item in the list has already been handed out.
    #[error("No more domains: all {total} domains have been dispensed")]
    Exhausted { total: usize },

    /// Invalid or corrupted input data.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// JSON serialization failed.
    #[error("JSON error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a JSON error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Whether this error signals the terminal "no more items" state.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
