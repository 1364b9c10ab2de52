//! Local utility tools that need no backend.

use std::sync::Arc;

use chrono::Local;
use serde_json::{Value, json};
use tracing::debug;

use crate::core::error::Result;
use crate::domains::tools::arguments::ArgumentBag;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::ToolHandler;
use crate::domains::tools::registry::{ToolDescriptor, ToolRegistryBuilder};
use crate::domains::tools::schema::{FieldKind, FieldSpec, ToolSchema};

pub struct CurrentTimeTool;

impl CurrentTimeTool {
    pub const NAME: &'static str = "get_current_time";
    pub const DESCRIPTION: &'static str = "Get the current local date and time (RFC 3339).";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Clock",
            ToolSchema::empty(),
            Arc::new(Self),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for CurrentTimeTool {
    async fn call(&self, _args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        Ok(Value::String(Local::now().to_rfc3339()))
    }
}

pub struct CalculateSumTool;

impl CalculateSumTool {
    pub const NAME: &'static str = "calculate_sum";
    pub const DESCRIPTION: &'static str = "Add two numbers. Integer inputs give an integer result.";

    pub fn descriptor() -> ToolDescriptor {
        let schema = ToolSchema::empty()
            .field(FieldSpec::new("a", FieldKind::Number, "First number").required())
            .field(FieldSpec::new("b", FieldKind::Number, "Second number").required());
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Calculation",
            schema,
            Arc::new(Self),
        )
    }

    fn sum(args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        if let (Some(a), Some(b)) = (args.i64("a"), args.i64("b")) {
            if let Some(total) = a.checked_add(b) {
                return Ok(json!(total));
            }
            debug!("Integer sum overflows, falling back to float");
        }

        let total = args.require_f64("a")? + args.require_f64("b")?;
        serde_json::Number::from_f64(total)
            .map(Value::Number)
            .ok_or_else(|| ToolError::invalid_arguments("sum is not a finite number"))
    }
}

#[async_trait::async_trait]
impl ToolHandler for CalculateSumTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        Self::sum(args)
    }
}

pub struct ReverseStringTool;

impl ReverseStringTool {
    pub const NAME: &'static str = "reverse_string";
    pub const DESCRIPTION: &'static str = "Reverse a string character by character.";

    pub fn descriptor() -> ToolDescriptor {
        let schema = ToolSchema::empty()
            .field(FieldSpec::new("text", FieldKind::String, "The string to reverse").required());
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "String reversal",
            schema,
            Arc::new(Self),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for ReverseStringTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        let text = args.require_str("text")?;
        Ok(Value::String(text.chars().rev().collect()))
    }
}

/// Register the local tools, in manifest order.
pub fn register(builder: &mut ToolRegistryBuilder) -> Result<()> {
    builder
        .register(CurrentTimeTool::descriptor())?
        .register(CalculateSumTool::descriptor())?
        .register(ReverseStringTool::descriptor())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(value: Value) -> ArgumentBag {
        ArgumentBag::from_value(Some(value)).unwrap()
    }

    #[tokio::test]
    async fn test_sum_of_integers_is_integer() {
        let result = CalculateSumTool.call(&bag(json!({"a": 15, "b": 7}))).await.unwrap();
        assert_eq!(result, json!(22));
        assert!(result.is_i64());
    }

    #[tokio::test]
    async fn test_sum_of_floats() {
        let result = CalculateSumTool.call(&bag(json!({"a": 1.5, "b": 2}))).await.unwrap();
        assert_eq!(result, json!(3.5));
    }

    #[tokio::test]
    async fn test_sum_overflow_falls_back_to_float() {
        let result = CalculateSumTool
            .call(&bag(json!({"a": i64::MAX, "b": 1})))
            .await
            .unwrap();
        assert!(result.is_f64());
    }

    #[tokio::test]
    async fn test_reverse_string() {
        let result = ReverseStringTool
            .call(&bag(json!({"text": "Hello World"})))
            .await
            .unwrap();
        assert_eq!(result, json!("dlroW olleH"));

        let result = ReverseStringTool.call(&bag(json!({"text": "añb"}))).await.unwrap();
        assert_eq!(result, json!("bña"));
    }

    #[tokio::test]
    async fn test_current_time_is_rfc3339() {
        let result = CurrentTimeTool.call(&ArgumentBag::default()).await.unwrap();
        let text = result.as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(text).is_ok());
    }
}
