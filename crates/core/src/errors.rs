//! Core error types for the reconciliation engine.
//!
//! Errors never cross a message handler boundary: the context logs them and
//! moves on to the next message. They exist so that internal steps can use
//! `?` and so that collaborators (surfaces, fetchers) can report failures.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the reconciliation core.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid message: {0}")]
    Message(#[from] MessageError),

    #[error("Failed to decode payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Positions fetch failed: {0}")]
    Fetch(String),

    #[error("Rendering surface rejected write: {0}")]
    Surface(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Structural problems with an inbound message.
///
/// Field-level coercion failures are not errors (the field is dropped);
/// these cover messages that cannot be routed at all.
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Field '{field}' has an unexpected shape: {message}")]
    InvalidShape { field: String, message: String },

    #[error("Chunk {index} is outside of the announced range 1..={count}")]
    ChunkOutOfRange { index: u32, count: u32 },
}

impl MessageError {
    /// Creates an InvalidShape error.
    pub fn invalid_shape(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidShape {
            field: field.into(),
            message: message.into(),
        }
    }
}
