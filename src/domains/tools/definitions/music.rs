//! Music catalog and download tools.
//!
//! Ids are MusicBrainz identifiers (UUIDs): recordings for songs, releases
//! for albums and downloads, artists for artist details.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::info;

use crate::backends::catalog::{DownloadStore, FilterKind, MusicCatalog};
use crate::core::error::Result;
use crate::domains::tools::arguments::ArgumentBag;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::{ToolHandler, to_payload};
use crate::domains::tools::registry::{ToolDescriptor, ToolRegistryBuilder};
use crate::domains::tools::schema::{FieldKind, FieldSpec, ToolSchema};

const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_TRENDING_LIMIT: usize = 20;

fn limit_field(default: usize) -> FieldSpec {
    FieldSpec::new(
        "limit",
        FieldKind::Integer,
        format!("Maximum number of results, 1-100 (default {})", default),
    )
}

fn id_field(description: &str) -> FieldSpec {
    FieldSpec::new("id", FieldKind::String, description).required()
}

pub struct MusicSearchTool {
    catalog: Arc<dyn MusicCatalog>,
}

impl MusicSearchTool {
    pub const NAME: &'static str = "music_search";
    pub const DESCRIPTION: &'static str = "Search the music catalog for songs, albums or artists. \
         The 'playlists' and 'videos' filters are not offered by MusicBrainz and report Unsupported.";

    pub fn descriptor(catalog: Arc<dyn MusicCatalog>) -> ToolDescriptor {
        let schema = ToolSchema::empty()
            .field(FieldSpec::new("query", FieldKind::String, "Search text").required())
            .field(limit_field(DEFAULT_SEARCH_LIMIT))
            .field(
                FieldSpec::new("filter_type", FieldKind::String, "Kind of entity to search (default songs)")
                    .one_of(FilterKind::ALL),
            );
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Music search",
            schema,
            Arc::new(Self { catalog }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for MusicSearchTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        let query = args.require_str("query")?;
        let limit = args.usize_or("limit", DEFAULT_SEARCH_LIMIT);
        let filter = FilterKind::parse(args.str("filter_type").unwrap_or("songs"))?;

        let items = self.catalog.search(query, limit, filter).await?;
        info!("Found {} {} matching '{}'", items.len(), filter.as_str(), query);
        to_payload(items)
    }
}

pub struct SongDetailsTool {
    catalog: Arc<dyn MusicCatalog>,
}

impl SongDetailsTool {
    pub const NAME: &'static str = "music_get_song_details";
    pub const DESCRIPTION: &'static str =
        "Get details for a song: artist, album, year, duration and genres.";

    pub fn descriptor(catalog: Arc<dyn MusicCatalog>) -> ToolDescriptor {
        let schema = ToolSchema::empty().field(id_field("Recording MBID"));
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Song details",
            schema,
            Arc::new(Self { catalog }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for SongDetailsTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        to_payload(self.catalog.get_details(args.require_str("id")?).await?)
    }
}

pub struct ArtistDetailsTool {
    catalog: Arc<dyn MusicCatalog>,
}

impl ArtistDetailsTool {
    pub const NAME: &'static str = "music_get_artist_details";
    pub const DESCRIPTION: &'static str = "Get details for an artist, including their releases.";

    pub fn descriptor(catalog: Arc<dyn MusicCatalog>) -> ToolDescriptor {
        let schema = ToolSchema::empty()
            .field(id_field("Artist MBID"))
            .field(limit_field(DEFAULT_SEARCH_LIMIT));
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Artist details",
            schema,
            Arc::new(Self { catalog }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for ArtistDetailsTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        let limit = args.usize_or("limit", DEFAULT_SEARCH_LIMIT);
        to_payload(self.catalog.get_artist(args.require_str("id")?, limit).await?)
    }
}

pub struct AlbumDetailsTool {
    catalog: Arc<dyn MusicCatalog>,
}

impl AlbumDetailsTool {
    pub const NAME: &'static str = "music_get_album_details";
    pub const DESCRIPTION: &'static str = "Get details for an album, including its track listing.";

    pub fn descriptor(catalog: Arc<dyn MusicCatalog>) -> ToolDescriptor {
        let schema = ToolSchema::empty().field(id_field("Release MBID"));
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Album details",
            schema,
            Arc::new(Self { catalog }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for AlbumDetailsTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        to_payload(self.catalog.get_album(args.require_str("id")?).await?)
    }
}

pub struct TrendingTool {
    catalog: Arc<dyn MusicCatalog>,
}

impl TrendingTool {
    pub const NAME: &'static str = "music_get_trending";
    pub const DESCRIPTION: &'static str =
        "Get the most listened recordings of the past week (ListenBrainz sitewide statistics).";

    pub fn descriptor(catalog: Arc<dyn MusicCatalog>) -> ToolDescriptor {
        let schema = ToolSchema::empty().field(limit_field(DEFAULT_TRENDING_LIMIT));
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Trending lookup",
            schema,
            Arc::new(Self { catalog }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for TrendingTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        let limit = args.usize_or("limit", DEFAULT_TRENDING_LIMIT);
        to_payload(self.catalog.get_trending(limit).await?)
    }
}

pub struct RecommendationsTool {
    catalog: Arc<dyn MusicCatalog>,
}

impl RecommendationsTool {
    pub const NAME: &'static str = "music_get_recommendations";
    pub const DESCRIPTION: &'static str =
        "Recommend songs related to a song (other recordings by the same artist).";

    pub fn descriptor(catalog: Arc<dyn MusicCatalog>) -> ToolDescriptor {
        let schema = ToolSchema::empty()
            .field(id_field("Seed recording MBID"))
            .field(limit_field(DEFAULT_SEARCH_LIMIT));
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Recommendations",
            schema,
            Arc::new(Self { catalog }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for RecommendationsTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        let limit = args.usize_or("limit", DEFAULT_SEARCH_LIMIT);
        to_payload(
            self.catalog
                .get_recommendations(args.require_str("id")?, limit)
                .await?,
        )
    }
}

pub struct DownloadTool {
    catalog: Arc<dyn MusicCatalog>,
}

impl DownloadTool {
    pub const NAME: &'static str = "music_download";
    pub const DESCRIPTION: &'static str = "Download the front cover art of a release into the download directory. \
         Without a filename the release title is used, so releases sharing a title overwrite each other.";

    pub fn descriptor(catalog: Arc<dyn MusicCatalog>) -> ToolDescriptor {
        let schema = ToolSchema::empty().field(id_field("Release MBID")).field(FieldSpec::new(
            "filename",
            FieldKind::String,
            "File name inside the download directory (extension added when missing)",
        ));
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Download",
            schema,
            Arc::new(Self { catalog }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for DownloadTool {
    async fn call(&self, args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        let record = self
            .catalog
            .download(args.require_str("id")?, args.str("filename"))
            .await?;
        info!("Downloaded {} ({} bytes)", record.path, record.size_bytes);
        to_payload(record)
    }
}

pub struct ListDownloadedTool {
    downloads: DownloadStore,
}

impl ListDownloadedTool {
    pub const NAME: &'static str = "music_list_downloaded";
    pub const DESCRIPTION: &'static str = "List files in the download directory, newest first.";

    pub fn descriptor(downloads: DownloadStore) -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            "Download listing",
            ToolSchema::empty(),
            Arc::new(Self { downloads }),
        )
    }
}

#[async_trait::async_trait]
impl ToolHandler for ListDownloadedTool {
    async fn call(&self, _args: &ArgumentBag) -> std::result::Result<Value, ToolError> {
        let downloads = self.downloads.clone();
        let files = tokio::task::spawn_blocking(move || downloads.list())
            .await
            .map_err(|e| ToolError::internal(format!("listing task failed: {}", e)))??;
        Ok(json!({
            "directory": self.downloads.root().display().to_string(),
            "count": files.len(),
            "files": files,
        }))
    }
}

/// Register the catalog and download tools, in manifest order.
pub fn register(
    builder: &mut ToolRegistryBuilder,
    catalog: Arc<dyn MusicCatalog>,
    downloads: DownloadStore,
) -> Result<()> {
    builder
        .register(MusicSearchTool::descriptor(catalog.clone()))?
        .register(SongDetailsTool::descriptor(catalog.clone()))?
        .register(ArtistDetailsTool::descriptor(catalog.clone()))?
        .register(AlbumDetailsTool::descriptor(catalog.clone()))?
        .register(TrendingTool::descriptor(catalog.clone()))?
        .register(RecommendationsTool::descriptor(catalog.clone()))?
        .register(DownloadTool::descriptor(catalog))?
        .register(ListDownloadedTool::descriptor(downloads))?;
    Ok(())
}
