//! STDIO transport implementation.
//!
//! stdout carries protocol frames only; logs go to stderr.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

pub struct StdioTransport;

impl StdioTransport {
    /// Serve until stdin closes.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!(
            tools = server.dispatcher().registry().len(),
            "Ready - communicating via stdin/stdout"
        );

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        service
            .waiting()
            .await
            .map_err(|e| TransportError::service(e.to_string()))?;

        info!("STDIO transport finished");
        Ok(())
    }
}
