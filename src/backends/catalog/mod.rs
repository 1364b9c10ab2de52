//! Music catalog adapter.
//!
//! - `types.rs` - catalog item and download records shared by every backend
//! - `common.rs` - MBID checks and formatting helpers
//! - `musicbrainz.rs` - MusicBrainz / ListenBrainz / Cover Art Archive backend
//! - `downloads.rs` - the download directory
//!
//! Tool handlers depend on the [`MusicCatalog`] trait only, so tests can swap
//! in an in-memory catalog.

pub mod common;
mod downloads;
mod musicbrainz;
mod types;

use super::error::BackendResult;

pub use downloads::{DownloadStore, derive_file_name};
pub use musicbrainz::MusicBrainzCatalog;
pub use types::{CatalogItem, DownloadRecord, DownloadedFile, FilterKind, ItemKind};

/// Operations offered by a music metadata provider.
#[async_trait::async_trait]
pub trait MusicCatalog: Send + Sync {
    /// Free-text search restricted to one entity kind.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        filter: FilterKind,
    ) -> BackendResult<Vec<CatalogItem>>;

    /// Full details for a single song.
    async fn get_details(&self, id: &str) -> BackendResult<CatalogItem>;

    /// Artist details including up to `limit` releases.
    async fn get_artist(&self, id: &str, limit: usize) -> BackendResult<CatalogItem>;

    /// Album details including its track listing.
    async fn get_album(&self, id: &str) -> BackendResult<CatalogItem>;

    /// Currently popular songs, ranked.
    async fn get_trending(&self, limit: usize) -> BackendResult<Vec<CatalogItem>>;

    /// Songs related to the given one.
    async fn get_recommendations(&self, id: &str, limit: usize)
    -> BackendResult<Vec<CatalogItem>>;

    /// Persist the downloadable media for `id` into the download directory.
    async fn download(&self, id: &str, filename: Option<&str>) -> BackendResult<DownloadRecord>;
}
