//! Tool definitions module.
//!
//! Tools are grouped by backend. Each group exposes a `register` function;
//! [`build_registry`] calls them in manifest order.

pub mod basic;
pub mod music;
pub mod postgres;

use std::sync::Arc;

use crate::backends::{DownloadStore, MusicCatalog, RelationalStore};
use crate::core::error::Result;

use super::registry::ToolRegistry;

pub use basic::{CalculateSumTool, CurrentTimeTool, ReverseStringTool};
pub use music::{
    AlbumDetailsTool, ArtistDetailsTool, DownloadTool, ListDownloadedTool, MusicSearchTool,
    RecommendationsTool, SongDetailsTool, TrendingTool,
};
pub use postgres::{
    PostgresExecuteTool, PostgresGetSchemaTool, PostgresListTablesTool, PostgresQueryTool,
};

/// Build the full tool registry over the given backends.
///
/// Fails if two tools share a name.
pub fn build_registry(
    store: Arc<dyn RelationalStore>,
    catalog: Arc<dyn MusicCatalog>,
    downloads: DownloadStore,
) -> Result<ToolRegistry> {
    let mut builder = ToolRegistry::builder();
    basic::register(&mut builder)?;
    postgres::register(&mut builder, store)?;
    music::register(&mut builder, catalog, downloads)?;
    Ok(builder.build())
}
