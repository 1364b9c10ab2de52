//! Music catalog backed by MusicBrainz, ListenBrainz and the Cover Art Archive.
//!
//! `musicbrainz_rs` and `reqwest::blocking` both run their own runtime, so
//! every upstream call happens on the blocking pool.

use std::time::Duration;

use async_trait::async_trait;
use musicbrainz_rs::entity::CoverartResponse;
use musicbrainz_rs::entity::artist::{Artist, ArtistSearchQuery};
use musicbrainz_rs::entity::coverart::{Coverart, CoverartImage, ImageType};
use musicbrainz_rs::entity::recording::{Recording, RecordingSearchQuery};
use musicbrainz_rs::entity::release::{Release, ReleaseSearchQuery};
use musicbrainz_rs::{Fetch, FetchCoverart, Search};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::MusicCatalog;
use super::common::{
    clamp_limit, classify_upstream, extract_year, format_duration, get_artist_name, require_mbid,
};
use super::downloads::DownloadStore;
use super::types::{CatalogItem, DownloadRecord, FilterKind, ItemKind};
use crate::backends::error::{BackendError, BackendResult};

/// Catalog adapter talking to the public MetaBrainz services.
#[derive(Debug, Clone)]
pub struct MusicBrainzCatalog {
    downloads: DownloadStore,
    listenbrainz_url: String,
    timeout: Duration,
}

impl MusicBrainzCatalog {
    pub fn new(downloads: DownloadStore, listenbrainz_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            downloads,
            listenbrainz_url: listenbrainz_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn downloads(&self) -> &DownloadStore {
        &self.downloads
    }

    /// Run a blocking upstream call off the async executor.
    async fn blocking<T, F>(&self, f: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Self) -> BackendResult<T> + Send + 'static,
    {
        let this = self.clone();
        tokio::task::spawn_blocking(move || f(this)).await?
    }

    fn http_client(&self) -> BackendResult<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::unavailable(format!("Failed to create HTTP client: {}", e)))
    }

    fn search_recordings(query: &str, limit: usize) -> BackendResult<Vec<CatalogItem>> {
        let search_query = RecordingSearchQuery::query_builder().recording(query).build();
        let result = Recording::search(search_query)
            .execute()
            .map_err(|e| classify_upstream("Recording search", e.to_string()))?;

        Ok(result
            .entities
            .into_iter()
            .take(limit)
            .map(recording_item)
            .collect())
    }

    fn search_releases(query: &str, limit: usize) -> BackendResult<Vec<CatalogItem>> {
        let search_query = ReleaseSearchQuery::query_builder().release(query).build();
        let result = Release::search(search_query)
            .execute()
            .map_err(|e| classify_upstream("Release search", e.to_string()))?;

        Ok(result
            .entities
            .into_iter()
            .take(limit)
            .map(release_item)
            .collect())
    }

    fn search_artists(query: &str, limit: usize) -> BackendResult<Vec<CatalogItem>> {
        let search_query = ArtistSearchQuery::query_builder().artist(query).build();
        let result = Artist::search(search_query)
            .execute()
            .map_err(|e| classify_upstream("Artist search", e.to_string()))?;

        Ok(result
            .entities
            .into_iter()
            .take(limit)
            .map(artist_item)
            .collect())
    }

    fn fetch_recording(id: &str) -> BackendResult<CatalogItem> {
        let recording = Recording::fetch()
            .id(id)
            .with_artists()
            .with_releases()
            .with_genres()
            .execute()
            .map_err(|e| classify_upstream("Recording lookup", e.to_string()))?;

        let album = recording
            .releases
            .as_ref()
            .and_then(|releases| releases.first())
            .map(|r| (r.title.clone(), r.date.as_ref().and_then(|d| extract_year(&d.0))));
        let genres = recording
            .genres
            .as_ref()
            .map(|gs| gs.iter().map(|g| g.name.clone()).collect())
            .unwrap_or_default();

        let mut item = recording_item(recording);
        if let Some((title, year)) = album {
            item.album = Some(title);
            item.year = year;
        }
        item.genres = genres;
        Ok(item)
    }

    fn fetch_artist(id: &str, limit: usize) -> BackendResult<CatalogItem> {
        let artist = Artist::fetch()
            .id(id)
            .execute()
            .map_err(|e| classify_upstream("Artist lookup", e.to_string()))?;

        let search_query = ReleaseSearchQuery::query_builder().arid(id).build();
        let releases = Release::search(search_query)
            .execute()
            .map_err(|e| classify_upstream("Release search", e.to_string()))?;

        let mut item = artist_item(artist);
        item.items = releases
            .entities
            .into_iter()
            .take(limit)
            .map(release_item)
            .collect();
        Ok(item)
    }

    fn fetch_album(id: &str) -> BackendResult<CatalogItem> {
        let release = Release::fetch()
            .id(id)
            .with_recordings()
            .execute()
            .map_err(|e| classify_upstream("Release lookup", e.to_string()))?;

        let tracks: Vec<CatalogItem> = release
            .media
            .iter()
            .flatten()
            .filter_map(|medium| medium.tracks.as_ref())
            .flatten()
            .filter_map(|track| track.recording.clone())
            .map(recording_item)
            .collect();

        let mut item = release_item(release);
        item.items = tracks;
        Ok(item)
    }

    fn fetch_recommendations(id: &str, limit: usize) -> BackendResult<Vec<CatalogItem>> {
        let seed = Recording::fetch()
            .id(id)
            .with_artists()
            .execute()
            .map_err(|e| classify_upstream("Recording lookup", e.to_string()))?;

        let artist_id = seed
            .artist_credit
            .as_ref()
            .and_then(|credits| credits.first())
            .map(|credit| credit.artist.id.clone())
            .ok_or_else(|| {
                BackendError::not_found(format!("Recording {} has no credited artist", id))
            })?;

        debug!("Recommending recordings by artist {}", artist_id);
        let search_query = RecordingSearchQuery::query_builder().arid(&artist_id).build();
        let result = Recording::search(search_query)
            .execute()
            .map_err(|e| classify_upstream("Recording search", e.to_string()))?;

        let mut seen_titles = vec![seed.title.to_lowercase()];
        let mut items = Vec::new();
        for recording in result.entities {
            if items.len() == limit {
                break;
            }
            let title_key = recording.title.to_lowercase();
            if recording.id == seed.id || seen_titles.contains(&title_key) {
                continue;
            }
            seen_titles.push(title_key);
            items.push(recording_item(recording));
        }
        Ok(items)
    }

    fn fetch_trending(&self, limit: usize) -> BackendResult<Vec<CatalogItem>> {
        let url = format!("{}/1/stats/sitewide/recordings", self.listenbrainz_url);
        let count = limit.to_string();
        let response = self
            .http_client()?
            .get(&url)
            .query(&[("count", count.as_str()), ("range", "week")])
            .send()
            .map_err(|e| BackendError::unavailable(format!("ListenBrainz request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            debug!("ListenBrainz has no sitewide statistics yet");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(classify_upstream(
                "ListenBrainz statistics",
                format!("HTTP {}", status),
            ));
        }

        let stats: SitewideRecordings = response.json().map_err(|e| {
            BackendError::unavailable(format!("Malformed ListenBrainz response: {}", e))
        })?;

        Ok(stats
            .payload
            .recordings
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, entry)| entry.into_item(index + 1))
            .collect())
    }

    fn download_cover(&self, id: &str, filename: Option<&str>) -> BackendResult<DownloadRecord> {
        let release = Release::fetch()
            .id(id)
            .execute()
            .map_err(|e| classify_upstream("Release lookup", e.to_string()))?;

        info!("Fetching cover art for release {}", id);
        let coverart = match Release::fetch_coverart().id(id).execute() {
            Ok(CoverartResponse::Json(coverart)) => coverart,
            Ok(CoverartResponse::Url(_)) => {
                return Err(BackendError::unavailable(
                    "Unexpected URL response from the Cover Art Archive",
                ));
            }
            Err(e) => return Err(classify_upstream("Cover art lookup", e.to_string())),
        };

        let image = select_best_image(&coverart).ok_or_else(|| {
            BackendError::not_found(format!("Release {} has no cover art", id))
        })?;
        let image_url = image_url(image);
        let extension = detect_extension(&image_url);

        // Validate the destination before spending the transfer.
        let path = self.downloads.target_path(&release.title, filename, extension)?;

        let response = self
            .http_client()?
            .get(&image_url)
            .send()
            .map_err(|e| BackendError::unavailable(format!("Image request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(classify_upstream(
                "Image download",
                format!("HTTP {}", response.status()),
            ));
        }
        let bytes = response
            .bytes()
            .map_err(|e| BackendError::unavailable(format!("Failed to read image: {}", e)))?;

        let size_bytes = self.downloads.write(&path, &bytes)?;

        Ok(DownloadRecord {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: path.display().to_string(),
            size_bytes,
            title: release.title,
            source_url: Some(image_url),
        })
    }
}

#[async_trait]
impl MusicCatalog for MusicBrainzCatalog {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        filter: FilterKind,
    ) -> BackendResult<Vec<CatalogItem>> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return Err(BackendError::invalid_input("Search query must not be empty"));
        }
        let limit = clamp_limit(limit);

        match filter {
            FilterKind::Songs => self.blocking(move |_| Self::search_recordings(&query, limit)).await,
            FilterKind::Albums => self.blocking(move |_| Self::search_releases(&query, limit)).await,
            FilterKind::Artists => self.blocking(move |_| Self::search_artists(&query, limit)).await,
            FilterKind::Playlists | FilterKind::Videos => {
                warn!("Filter '{}' requested from MusicBrainz", filter.as_str());
                Err(BackendError::unsupported(format!(
                    "MusicBrainz does not index {}",
                    filter.as_str()
                )))
            }
        }
    }

    async fn get_details(&self, id: &str) -> BackendResult<CatalogItem> {
        let id = require_mbid(id)?.to_string();
        self.blocking(move |_| Self::fetch_recording(&id)).await
    }

    async fn get_artist(&self, id: &str, limit: usize) -> BackendResult<CatalogItem> {
        let id = require_mbid(id)?.to_string();
        let limit = clamp_limit(limit);
        self.blocking(move |_| Self::fetch_artist(&id, limit)).await
    }

    async fn get_album(&self, id: &str) -> BackendResult<CatalogItem> {
        let id = require_mbid(id)?.to_string();
        self.blocking(move |_| Self::fetch_album(&id)).await
    }

    async fn get_trending(&self, limit: usize) -> BackendResult<Vec<CatalogItem>> {
        let limit = clamp_limit(limit);
        self.blocking(move |this| this.fetch_trending(limit)).await
    }

    async fn get_recommendations(&self, id: &str, limit: usize) -> BackendResult<Vec<CatalogItem>> {
        let id = require_mbid(id)?.to_string();
        let limit = clamp_limit(limit);
        self.blocking(move |_| Self::fetch_recommendations(&id, limit)).await
    }

    async fn download(&self, id: &str, filename: Option<&str>) -> BackendResult<DownloadRecord> {
        let id = require_mbid(id)?.to_string();
        let filename = filename.map(str::to_string);
        self.blocking(move |this| this.download_cover(&id, filename.as_deref()))
            .await
    }
}

fn recording_item(recording: Recording) -> CatalogItem {
    let mut item = CatalogItem::new(ItemKind::Song, recording.id, recording.title);
    item.artist = get_artist_name(&recording.artist_credit);
    item.duration = recording.length.map(|l| format_duration(l as u64));
    item.disambiguation = recording.disambiguation.filter(|d| !d.is_empty());
    item
}

fn release_item(release: Release) -> CatalogItem {
    let mut item = CatalogItem::new(ItemKind::Album, release.id, release.title);
    item.artist = get_artist_name(&release.artist_credit);
    item.year = release.date.as_ref().and_then(|d| extract_year(&d.0));
    item.country = release.country.filter(|c| !c.is_empty());
    item
}

fn artist_item(artist: Artist) -> CatalogItem {
    let mut item = CatalogItem::new(ItemKind::Artist, artist.id, artist.name);
    item.country = artist.country.filter(|c| !c.is_empty());
    if !artist.disambiguation.is_empty() {
        item.disambiguation = Some(artist.disambiguation);
    }
    item
}

/// Front image first, then anything typed as front, then the first image.
fn select_best_image(coverart: &Coverart) -> Option<&CoverartImage> {
    coverart
        .images
        .iter()
        .find(|img| img.front)
        .or_else(|| {
            coverart
                .images
                .iter()
                .find(|img| img.types.iter().any(|t| matches!(t, ImageType::Front)))
        })
        .or_else(|| coverart.images.first())
}

/// The 500px thumbnail, falling back to larger sizes and then the original.
fn image_url(image: &CoverartImage) -> String {
    image
        .thumbnails
        .res_500
        .clone()
        .or_else(|| image.thumbnails.res_1200.clone())
        .or_else(|| image.thumbnails.res_250.clone())
        .unwrap_or_else(|| image.image.clone())
}

fn detect_extension(url: &str) -> &'static str {
    let lower = url.to_lowercase();
    if lower.ends_with(".png") {
        "png"
    } else if lower.ends_with(".gif") {
        "gif"
    } else if lower.ends_with(".webp") {
        "webp"
    } else {
        "jpg"
    }
}

#[derive(Debug, Deserialize)]
struct SitewideRecordings {
    payload: SitewidePayload,
}

#[derive(Debug, Deserialize)]
struct SitewidePayload {
    #[serde(default)]
    recordings: Vec<SitewideRecording>,
}

#[derive(Debug, Deserialize)]
struct SitewideRecording {
    artist_name: String,
    track_name: String,
    #[serde(default)]
    release_name: Option<String>,
    #[serde(default)]
    recording_mbid: Option<String>,
    #[serde(default)]
    listen_count: Option<u64>,
}

impl SitewideRecording {
    fn into_item(self, rank: usize) -> CatalogItem {
        let mut item = CatalogItem::new(
            ItemKind::Song,
            self.recording_mbid.unwrap_or_default(),
            self.track_name,
        );
        item.artist = Some(self.artist_name);
        item.album = self.release_name.filter(|r| !r.is_empty());
        item.rank = Some(rank);
        item.listen_count = self.listen_count;
        item
    }
}
