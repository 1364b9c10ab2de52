//! Tool argument schemas and the validator.
//!
//! A [`ToolSchema`] is an ordered list of typed fields. It renders itself as a
//! JSON-Schema object for the tool manifest and checks incoming argument bags
//! before a handler runs.

use std::sync::Arc;

use serde_json::{Map, Value, json};

/// The JSON kind a field accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    /// A number that converts losslessly to `i64` (`5` and `5.0`, not `5.5`).
    Integer,
    Boolean,
    /// Any string, number, boolean or null.
    Scalar,
    Array(Box<FieldKind>),
}

impl FieldKind {
    pub fn array_of(item: FieldKind) -> Self {
        Self::Array(Box::new(item))
    }

    /// Name of this kind, matching the JSON-Schema `type` keyword where one exists.
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Scalar => "scalar",
            Self::Array(_) => "array",
        }
    }

    /// Whether `value` has this kind. Array kinds check every element.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::Integer, Value::Number(n)) => as_lossless_i64(n).is_some(),
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Scalar, value) => !value.is_array() && !value.is_object(),
            (Self::Array(item), Value::Array(values)) => values.iter().all(|v| item.accepts(v)),
            _ => false,
        }
    }

    fn to_json_schema(&self) -> Value {
        match self {
            Self::Array(item) => json!({"type": "array", "items": item.to_json_schema()}),
            Self::Scalar => json!({"type": ["string", "number", "boolean", "null"]}),
            other => json!({"type": other.json_type()}),
        }
    }
}

/// Convert a JSON number to `i64` when no precision is lost.
pub fn as_lossless_i64(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    // i64::MAX is not representable as f64; the bound below is exclusive.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// One named field of a tool schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub description: String,
    pub allowed_values: Option<Vec<Value>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
            allowed_values: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict the field to a fixed set of string values.
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(|v| Value::String(v.into())).collect());
        self
    }
}

/// Ordered set of fields describing a tool's arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSchema {
    fields: Vec<FieldSpec>,
}

impl ToolSchema {
    /// A schema with no fields.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First field name declared more than once, if any.
    pub fn duplicate_field(&self) -> Option<&str> {
        self.fields.iter().enumerate().find_map(|(i, field)| {
            self.fields[..i]
                .iter()
                .any(|earlier| earlier.name == field.name)
                .then_some(field.name.as_str())
        })
    }

    /// Render as a JSON-Schema object for the tool manifest.
    pub fn to_json_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut property = match field.kind.to_json_schema() {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            if !field.description.is_empty() {
                property.insert("description".into(), Value::String(field.description.clone()));
            }
            if let Some(allowed) = &field.allowed_values {
                property.insert("enum".into(), Value::Array(allowed.clone()));
            }
            properties.insert(field.name.clone(), Value::Object(property));
        }

        let required: Vec<Value> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| Value::String(f.name.clone()))
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), Value::String("object".into()));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), Value::Array(required));
        schema
    }

    /// Shared form used by the MCP tool model.
    pub fn to_input_schema(&self) -> Arc<Map<String, Value>> {
        Arc::new(self.to_json_schema())
    }

    /// Check `args` against the schema.
    ///
    /// Unknown keys are ignored and `null` counts as absent. Strings are never
    /// coerced to numbers.
    pub fn validate(&self, args: &Map<String, Value>) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        for field in &self.fields {
            let value = match args.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        outcome.missing_required.push(field.name.clone());
                    }
                    continue;
                }
                Some(value) => value,
            };

            if !field.kind.accepts(value) {
                outcome.type_mismatches.push(TypeMismatch {
                    field: field.name.clone(),
                    reason: MismatchReason::WrongKind {
                        expected: field.kind.json_type(),
                    },
                });
                continue;
            }

            if let Some(allowed) = &field.allowed_values {
                if !allowed.contains(value) {
                    outcome.type_mismatches.push(TypeMismatch {
                        field: field.name.clone(),
                        reason: MismatchReason::NotAllowed {
                            allowed: allowed.clone(),
                        },
                    });
                }
            }
        }

        outcome
    }
}

/// Why a present value was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum MismatchReason {
    /// The value has the wrong JSON kind.
    WrongKind { expected: &'static str },
    /// The value has the right kind but is not in the enumeration.
    NotAllowed { allowed: Vec<Value> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeMismatch {
    pub field: String,
    pub reason: MismatchReason,
}

impl std::fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            MismatchReason::WrongKind { expected } => {
                write!(f, "'{}' must be of type {}", self.field, expected)
            }
            MismatchReason::NotAllowed { allowed } => {
                let allowed: Vec<String> = allowed.iter().map(Value::to_string).collect();
                write!(f, "'{}' must be one of: {}", self.field, allowed.join(", "))
            }
        }
    }
}

/// Result of validating an argument bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    pub missing_required: Vec<String>,
    pub type_mismatches: Vec<TypeMismatch>,
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        self.missing_required.is_empty() && self.type_mismatches.is_empty()
    }

    /// Human-readable summary of every problem found.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing_required.is_empty() {
            parts.push(format!(
                "missing required argument(s): {}",
                self.missing_required.join(", ")
            ));
        }
        parts.extend(self.type_mismatches.iter().map(ToString::to_string));
        parts.join("; ")
    }
}
