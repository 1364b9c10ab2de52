//! Startup errors for the dispatch server.
//!
//! Only registry and directory construction return these. Once the server
//! runs, every call failure travels inside an invocation envelope instead.

use thiserror::Error;

/// A specialized Result type for server construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while assembling the tool registry or resource directory.
#[derive(Debug, Error)]
pub enum Error {
    /// Two tools were registered under the same name.
    #[error("Duplicate tool registration: {0}")]
    DuplicateTool(String),

    /// Two resources were registered under the same URI.
    #[error("Duplicate resource registration: {0}")]
    DuplicateResource(String),

    /// A tool schema declares the same field twice.
    #[error("Tool '{tool}' declares field '{field}' more than once")]
    DuplicateField { tool: String, field: String },
}
