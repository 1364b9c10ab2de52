//! Server plumbing shared by every domain.
//!
//! - `config` - environment-driven settings
//! - `error` - the startup error type
//! - `security` - download path confinement
//! - `server` - the rmcp handler wrapping the dispatcher
//! - `transport` - stdio and HTTP bindings

pub mod config;
pub mod error;
pub mod security;
pub mod server;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use security::{PathSecurityError, resolve_within_root};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
