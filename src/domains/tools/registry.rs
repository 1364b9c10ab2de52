//! Tool Registry - the immutable table of callable tools.
//!
//! Tools are registered once at startup through [`ToolRegistryBuilder`]. The
//! built [`ToolRegistry`] has no mutating methods and is shared behind an
//! `Arc`, so concurrent dispatches read it without locking.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::Tool;
use serde_json::{Map, Value};
use tracing::debug;

use super::handlers::ToolHandler;
use super::schema::ToolSchema;
use crate::core::error::{Error, Result};

/// Everything the server knows about one tool.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// Label used in failure messages, e.g. `"Query"` gives `"Query failed: ..."`.
    pub category: String,
    pub schema: ToolSchema,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        schema: ToolSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: category.into(),
            schema,
            handler,
        }
    }

    /// Manifest entry: `{name, description, inputSchema}`.
    pub fn manifest_entry(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("name".into(), Value::String(self.name.clone()));
        entry.insert("description".into(), Value::String(self.description.clone()));
        entry.insert(
            "inputSchema".into(),
            Value::Object(self.schema.to_json_schema()),
        );
        Value::Object(entry)
    }

    /// The rmcp tool model for `tools/list`.
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            title: None,
            description: Some(self.description.clone().into()),
            input_schema: self.schema.to_input_schema(),
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        }
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("fields", &self.schema.fields().len())
            .finish()
    }
}

/// Collects descriptors before the registry is frozen.
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<ToolDescriptor>>,
    index: HashMap<String, usize>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool.
    ///
    /// A name that is already registered, or a schema that declares a field
    /// twice, is a startup error.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<&mut Self> {
        if self.index.contains_key(&descriptor.name) {
            return Err(Error::DuplicateTool(descriptor.name));
        }
        if let Some(field) = descriptor.schema.duplicate_field() {
            return Err(Error::DuplicateField {
                tool: descriptor.name.clone(),
                field: field.to_string(),
            });
        }

        debug!("Registered tool '{}'", descriptor.name);
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(Arc::new(descriptor));
        Ok(self)
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            tools: self.tools,
            index: self.index,
        }
    }
}

/// Immutable tool table.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<Arc<ToolDescriptor>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> &[Arc<ToolDescriptor>] {
        &self.tools
    }

    pub fn resolve(&self, name: &str) -> Option<&Arc<ToolDescriptor>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// The `tools/list` manifest as plain JSON.
    pub fn manifest(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.manifest_entry()).collect()
    }

    /// All tools as rmcp models.
    pub fn to_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.to_tool()).collect()
    }
}
