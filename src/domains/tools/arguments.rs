//! Per-call argument bag.

use serde_json::{Map, Value};

use super::error::ToolError;
use super::schema::as_lossless_i64;

/// Decoded tool arguments, keyed by field name.
///
/// JSON `null` is treated exactly like an absent key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentBag {
    values: Map<String, Value>,
}

impl ArgumentBag {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Decode the raw `arguments` member of a call request.
    ///
    /// Absent or `null` arguments give an empty bag; anything other than a
    /// JSON object is rejected.
    pub fn from_value(raw: Option<Value>) -> Result<Self, String> {
        match raw {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(Value::Object(map)) => Ok(Self::new(map)),
            Some(other) => Err(format!(
                "arguments must be a JSON object, got {}",
                json_kind(&other)
            )),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Drop a value so the handler falls back to its default.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Number(n)) => as_lossless_i64(n),
            _ => None,
        }
    }

    /// A non-negative integer, saturating negative values to zero.
    pub fn usize_or(&self, name: &str, default: usize) -> usize {
        self.i64(name)
            .map(|v| usize::try_from(v).unwrap_or(0))
            .unwrap_or(default)
    }

    /// Elements of an array argument; empty when absent or not an array.
    pub fn list(&self, name: &str) -> &[Value] {
        match self.get(name) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// A required string. Validation normally guarantees presence.
    pub fn require_str(&self, name: &str) -> Result<&str, ToolError> {
        self.str(name)
            .ok_or_else(|| ToolError::invalid_arguments(format!("'{}' is required", name)))
    }

    pub fn require_f64(&self, name: &str) -> Result<f64, ToolError> {
        self.f64(name)
            .ok_or_else(|| ToolError::invalid_arguments(format!("'{}' must be a number", name)))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
