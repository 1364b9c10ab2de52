//! MCP Server implementation.
//!
//! [`McpServer`] implements the rmcp `ServerHandler` trait for the stdio
//! binding and exposes plain-JSON helpers for the HTTP binding. Both paths
//! end in the same [`Dispatcher`] and [`ResourceDirectory`], so a call
//! behaves identically whichever transport carried it.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::resources::{ResourceDirectory, ResourceError};
use crate::domains::tools::{Dispatcher, FailureKind, InvocationResult};

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Routes tool calls to their handlers.
    dispatcher: Arc<Dispatcher>,

    /// Readable resources.
    resources: Arc<ResourceDirectory>,
}

impl McpServer {
    pub fn new(config: Config, dispatcher: Dispatcher, resources: ResourceDirectory) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            resources: Arc::new(resources),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run a tool call and wrap the envelope as an MCP result.
    pub async fn invoke(&self, name: &str, arguments: Option<Value>) -> CallToolResult {
        let result = self.dispatcher.dispatch(name, arguments).await;
        to_call_tool_result(&result)
    }

    /// Read a resource as MCP contents.
    ///
    /// An unknown URI comes back as the rendered `UnknownResource` failure.
    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult, String> {
        match self.resources.read_text(uri).await {
            Ok(text) => {
                let mime_type = self.resources.get(uri).map(|r| r.mime_type.clone());
                Ok(ReadResourceResult {
                    contents: vec![ResourceContents::TextResourceContents {
                        uri: uri.to_string(),
                        mime_type,
                        text,
                        meta: None,
                    }],
                })
            }
            Err(e @ ResourceError::UnknownResource(_)) => {
                Err(InvocationResult::failure(FailureKind::UnknownResource, e.to_string()).render())
            }
            Err(e) => Err(format!("Resource read failed: {}", e)),
        }
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<Value> {
        self.dispatcher.registry().manifest()
    }

    /// Call a tool by name (for HTTP transport).
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Value {
        let result = self.invoke(name, arguments).await;
        serde_json::to_value(&result).unwrap_or_else(|e| {
            json!({
                "content": [{"type": "text", "text": format!("Result encoding failed: {}", e)}],
                "isError": true
            })
        })
    }

    /// List all available resources (for HTTP transport).
    pub fn list_resources(&self) -> Vec<Value> {
        self.resources
            .list()
            .iter()
            .map(|r| {
                json!({
                    "uri": r.uri,
                    "name": r.name,
                    "description": r.description,
                    "mimeType": r.mime_type
                })
            })
            .collect()
    }

    /// Read a resource by URI (for HTTP transport).
    pub async fn read_resource(&self, uri: &str) -> Result<Value, String> {
        let result = self.read(uri).await?;
        Ok(json!({ "contents": result.contents }))
    }
}

/// Convert an envelope into the MCP tool result: one text block, with
/// `isError` set for failures.
pub fn to_call_tool_result(result: &InvocationResult) -> CallToolResult {
    let content = vec![Content::text(result.render())];
    if result.is_error() {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Tools for a PostgreSQL database and the MusicBrainz music catalog. \
                 Music ids are MusicBrainz identifiers (UUIDs)."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.dispatcher.registry().to_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.map(Value::Object);
        Ok(self.invoke(&request.name, arguments).await)
    }

    #[instrument(skip(self, _request, _context))]
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        info!("Listing resources");
        Ok(ListResourcesResult {
            resources: self.resources.to_resources(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        info!("Reading resource: {}", request.uri);
        self.read(&request.uri)
            .await
            .map_err(|message| McpError::resource_not_found(message, None))
    }
}
