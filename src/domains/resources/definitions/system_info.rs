//! Server information resource (dynamic).

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Value, json};
use tracing::warn;

use super::{ResourceDescriptor, ResourceProducer};
use crate::backends::RelationalStore;
use crate::domains::resources::error::ResourceError;

/// Tables shown in the document; the count covers all of them.
const MAX_LISTED_TABLES: usize = 10;

pub struct SystemInfoResource {
    server_name: String,
    version: String,
    tool_count: usize,
    started: Instant,
    store: Arc<dyn RelationalStore>,
}

impl SystemInfoResource {
    pub const URI: &'static str = "example://system-info";
    pub const NAME: &'static str = "System Information";
    pub const DESCRIPTION: &'static str =
        "Server version, capabilities, uptime and database status";

    pub fn new(
        server_name: impl Into<String>,
        version: impl Into<String>,
        tool_count: usize,
        store: Arc<dyn RelationalStore>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            version: version.into(),
            tool_count,
            started: Instant::now(),
            store,
        }
    }

    pub fn descriptor(self) -> ResourceDescriptor {
        ResourceDescriptor::json(Self::URI, Self::NAME, Self::DESCRIPTION, Arc::new(self))
    }
}

#[async_trait::async_trait]
impl ResourceProducer for SystemInfoResource {
    async fn produce(&self) -> Result<Value, ResourceError> {
        // A database failure is part of the report, not a read failure.
        let (database_status, tables) = match self.store.list_tables().await {
            Ok(tables) => ("Connected".to_string(), tables),
            Err(e) => {
                warn!("System info: database unavailable: {}", e);
                (format!("Disconnected: {}", e), Vec::new())
            }
        };

        Ok(json!({
            "server_name": self.server_name,
            "version": self.version,
            "capabilities": ["tools", "resources", "postgres_integration", "music_catalog_integration"],
            "uptime_secs": self.started.elapsed().as_secs_f64(),
            "database_status": database_status,
            "database_tables_count": tables.len(),
            "available_tables": tables.iter().take(MAX_LISTED_TABLES).collect::<Vec<_>>(),
            "total_tools": self.tool_count,
        }))
    }
}
