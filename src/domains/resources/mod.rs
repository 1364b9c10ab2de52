//! Resources domain module.
//!
//! Resources are read-only JSON documents that MCP clients can list and
//! read by URI.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual resources (one file per resource)
//! - `registry.rs` - The ordered resource directory and its builder
//! - `error.rs` - Resource-specific error types

pub mod definitions;
mod error;
mod registry;

pub use definitions::{ResourceDescriptor, ResourceProducer};
pub use error::ResourceError;
pub use registry::{ResourceDirectory, ResourceDirectoryBuilder, build_directory};
