//! Music Dispatch Server Entry Point
//!
//! Loads configuration, wires the backends into the tool registry and the
//! resource directory, then serves them on the configured transport.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use music_dispatch_server::backends::{DownloadStore, MusicBrainzCatalog, PostgresStore};
use music_dispatch_server::core::config::LoggingConfig;
use music_dispatch_server::core::{Config, McpServer, TransportService};
use music_dispatch_server::domains::resources::build_directory;
use music_dispatch_server::domains::tools::{Dispatcher, build_registry};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging first, so warnings about malformed settings are not lost.
    dotenvy::dotenv().ok();
    init_logging(&LoggingConfig::from_env());

    let config = Config::from_env();

    info!("Starting {} v{}", config.server.name, config.server.version);
    info!("Database target: {}", config.database.target());

    let downloads = DownloadStore::new(config.downloads.dir.clone());

    // The pool connects on first use, so a missing database only fails calls.
    let store = Arc::new(
        PostgresStore::connect_lazy(&config.database)
            .context("invalid database configuration")?,
    );
    let catalog = Arc::new(MusicBrainzCatalog::new(
        downloads.clone(),
        config.catalog.listenbrainz_url.clone(),
        config.catalog.http_timeout_secs,
    ));

    let registry = build_registry(store.clone(), catalog, downloads)?;
    let resources = build_directory(&config, registry.len(), store)?;
    info!(
        tools = registry.len(),
        resources = resources.list().len(),
        "Server initialized"
    );

    let dispatcher = Dispatcher::new(Arc::new(registry));
    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::new(config, dispatcher, resources);

    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs always go to stderr; stdout belongs to the stdio transport.
fn init_logging(logging: &LoggingConfig) {
    let level = match logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if logging.with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
