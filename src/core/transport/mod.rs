//! Transport layer for the MCP server.
//!
//! - **STDIO**: line-delimited JSON-RPC on stdin/stdout - feature: `stdio`
//! - **HTTP**: JSON-RPC over POST requests - feature: `http`
//!
//! Both bindings hand tool calls to the same dispatcher, so results and
//! failure texts are identical whichever one carried the request.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;
