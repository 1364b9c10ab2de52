//! Tool handler trait.
//!
//! A handler is the bound implementation behind one tool. It receives an
//! argument bag that has already passed schema validation and returns a JSON
//! payload. Handlers hold their backend adapter as a trait object, so each
//! one maps onto exactly one backend operation.

use serde::Serialize;
use serde_json::Value;

use super::arguments::ArgumentBag;
use super::error::ToolError;

/// Implementation behind a registered tool.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with validated arguments.
    async fn call(&self, args: &ArgumentBag) -> Result<Value, ToolError>;
}

/// Encode a handler result as the success payload.
pub fn to_payload<T: Serialize>(value: T) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(value)?)
}
