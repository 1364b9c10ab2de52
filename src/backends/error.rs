//! Backend adapter error types.
//!
//! Every adapter translates its collaborator's native errors into this small
//! closed set before returning, so nothing above the adapter layer ever sees a
//! `sqlx::Error`, a `reqwest::Error` or a MusicBrainz client error.

use thiserror::Error;

/// Result type for backend adapter operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors surfaced by backend adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The requested entity does not exist upstream.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The upstream service could not be reached or failed to answer.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream service rejected the input (bad id, malformed SQL, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The backend does not offer this operation.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl BackendError {
    /// Create a new "not found" error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new "upstream unavailable" error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Create a new "invalid input" error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new "unsupported" error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Stable lowercase label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::InvalidInput(_) => "invalid_input",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(e.to_string()),
            std::io::ErrorKind::InvalidInput => Self::InvalidInput(e.to_string()),
            _ => Self::UpstreamUnavailable(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for BackendError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::UpstreamUnavailable(format!("Background task failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err: BackendError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[test]
    fn test_io_other_maps_to_unavailable() {
        let err: BackendError = std::io::Error::other("disk on fire").into();
        assert_eq!(err.kind(), "upstream_unavailable");
    }

    #[test]
    fn test_display_keeps_message() {
        let err = BackendError::unsupported("no playlists");
        assert_eq!(err.to_string(), "Unsupported: no playlists");
    }
}
