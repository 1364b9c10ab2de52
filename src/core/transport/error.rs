//! Transport error types.

use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

/// Failures while starting or running a transport binding.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP listener stopped with an I/O failure.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The rmcp session could not be established.
    #[error("Server initialization error: {0}")]
    InitError(String),

    /// The rmcp session ended abnormally.
    #[error("Service error: {0}")]
    ServiceError(String),
}

impl TransportError {
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }

    pub fn init(msg: impl Into<String>) -> Self {
        Self::InitError(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        Self::ServiceError(msg.into())
    }
}
