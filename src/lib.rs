//! Music Dispatch Server Library
//!
//! An MCP server that validates tool calls against declared schemas and
//! dispatches them to a PostgreSQL database, the MusicBrainz catalog and a
//! local download directory.
//!
//! # Architecture
//!
//! - **core**: configuration, errors, the rmcp server handler and transports
//! - **domains**: what clients see
//!   - **tools**: schemas, the registry and the dispatcher
//!   - **resources**: readable JSON documents
//! - **backends**: adapters for the relational store and the music catalog
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use music_dispatch_server::backends::{DownloadStore, MusicBrainzCatalog, PostgresStore};
//! use music_dispatch_server::core::{Config, McpServer, TransportService};
//! use music_dispatch_server::domains::{resources::build_directory, tools::{Dispatcher, build_registry}};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let downloads = DownloadStore::new(config.downloads.dir.clone());
//!     let store = Arc::new(PostgresStore::connect_lazy(&config.database)?);
//!     let catalog = Arc::new(MusicBrainzCatalog::new(
//!         downloads.clone(),
//!         config.catalog.listenbrainz_url.clone(),
//!         config.catalog.http_timeout_secs,
//!     ));
//!
//!     let registry = build_registry(store.clone(), catalog, downloads)?;
//!     let resources = build_directory(&config, registry.len(), store)?;
//!     let dispatcher = Dispatcher::new(Arc::new(registry));
//!
//!     let transport = TransportService::new(config.transport.clone());
//!     transport.run(McpServer::new(config, dispatcher, resources)).await?;
//!     Ok(())
//! }
//! ```

pub mod backends;
pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
