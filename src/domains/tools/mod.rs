//! Tools domain module.
//!
//! Tools are named, schema-described operations that MCP clients call.
//!
//! ## Architecture
//!
//! - `schema.rs` - Field kinds, tool schemas and the argument validator
//! - `arguments.rs` - The per-call argument bag
//! - `handlers.rs` - The `ToolHandler` trait every tool implements
//! - `registry.rs` - Immutable registry of tool descriptors
//! - `dispatcher.rs` - Resolve, validate, invoke; the single failure boundary
//! - `definitions/` - Concrete tools, grouped by backend
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Implement `ToolHandler` for a struct holding the backend it needs
//! 2. Give it a `descriptor()` with name, description, category and schema
//! 3. Register it in the `register` function of its group
//!
//! Transports never need to change: they only talk to the `Dispatcher`.

mod arguments;
pub mod definitions;
mod dispatcher;
mod error;
mod handlers;
mod registry;
mod schema;

pub use arguments::ArgumentBag;
pub use definitions::build_registry;
pub use dispatcher::{Dispatcher, FailureKind, InvocationResult};
pub use error::ToolError;
pub use handlers::{ToolHandler, to_payload};
pub use registry::{ToolDescriptor, ToolRegistry, ToolRegistryBuilder};
pub use schema::{FieldKind, FieldSpec, MismatchReason, ToolSchema, TypeMismatch, ValidationOutcome};
