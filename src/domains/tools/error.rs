//! Tool-specific error types.

use thiserror::Error;

use crate::backends::BackendError;

/// Errors a tool handler can return.
///
/// The dispatcher turns every variant into a `HandlerError` failure envelope;
/// the `Display` text becomes the envelope message.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A backend adapter reported a failure.
    #[error("{0}")]
    Backend(#[from] BackendError),

    /// Arguments passed validation but the handler could not use them.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The handler produced a payload that could not be encoded.
    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
