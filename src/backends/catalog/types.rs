//! Records returned by music catalog backends.

use serde::Serialize;

use crate::backends::error::{BackendError, BackendResult};

/// Entity kinds a caller can restrict a search to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Songs,
    Albums,
    Artists,
    Playlists,
    Videos,
}

impl FilterKind {
    /// Every accepted filter value, in manifest order.
    pub const ALL: [&'static str; 5] = ["songs", "albums", "artists", "playlists", "videos"];

    pub fn parse(value: &str) -> BackendResult<Self> {
        match value {
            "songs" => Ok(Self::Songs),
            "albums" => Ok(Self::Albums),
            "artists" => Ok(Self::Artists),
            "playlists" => Ok(Self::Playlists),
            "videos" => Ok(Self::Videos),
            other => Err(BackendError::invalid_input(format!(
                "Unknown filter type '{}'. Use one of: {}",
                other,
                Self::ALL.join(", ")
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Songs => "songs",
            Self::Albums => "albums",
            Self::Artists => "artists",
            Self::Playlists => "playlists",
            Self::Videos => "videos",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Song,
    Album,
    Artist,
}

/// A normalized catalog entry.
///
/// Optional fields are omitted from the JSON payload when the provider does
/// not supply them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_count: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    /// Nested entries: releases of an artist, tracks of an album.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<CatalogItem>,
}

impl CatalogItem {
    pub fn new(kind: ItemKind, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            title: title.into(),
            artist: None,
            album: None,
            duration: None,
            year: None,
            country: None,
            disambiguation: None,
            rank: None,
            listen_count: None,
            genres: Vec::new(),
            items: Vec::new(),
        }
    }
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRecord {
    pub filename: String,
    pub path: String,
    pub size_bytes: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// A file already present in the download directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadedFile {
    pub filename: String,
    pub path: String,
    pub size_bytes: u64,
    /// RFC 3339 modification time.
    pub modified: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_kind_parse() {
        assert_eq!(FilterKind::parse("albums").unwrap(), FilterKind::Albums);
        assert!(FilterKind::parse("podcasts").is_err());
        for value in FilterKind::ALL {
            assert_eq!(FilterKind::parse(value).unwrap().as_str(), value);
        }
    }

    #[test]
    fn test_catalog_item_omits_empty_fields() {
        let item = CatalogItem::new(ItemKind::Song, "abc", "Creep");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json, serde_json::json!({"type": "song", "id": "abc", "title": "Creep"}));
    }
}
