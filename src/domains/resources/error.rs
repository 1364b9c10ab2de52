//! Resource-specific error types.

use thiserror::Error;

/// Errors that can occur during resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// No resource is registered under the URI.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// The resource document could not be produced.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResourceError {
    /// Create a new "unknown resource" error.
    pub fn unknown(uri: impl Into<String>) -> Self {
        Self::UnknownResource(uri.into())
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
