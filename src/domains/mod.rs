//! Domains module containing what MCP clients interact with.
//!
//! - **tools**: schema-validated operations routed through one dispatcher
//! - **resources**: read-only JSON documents addressed by URI

pub mod resources;
pub mod tools;
