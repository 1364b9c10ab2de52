//! The download directory.
//!
//! Files are named from the item's display title unless the caller supplies
//! a name. Titles are not unique, so two items with the same title map to the
//! same file and the later download overwrites the earlier one.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::types::DownloadedFile;
use crate::backends::error::{BackendError, BackendResult};
use crate::core::security::resolve_within_root;

const FALLBACK_STEM: &str = "download";

/// Turn a display title into a filesystem-safe file name.
///
/// Characters other than word characters, whitespace and `-` are dropped,
/// then every run of whitespace and dashes becomes a single `-`.
pub fn derive_file_name(title: &str, extension: &str) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let mut stem = String::with_capacity(kept.len());
    let mut in_separator_run = false;
    for c in kept.trim().chars() {
        if c == '-' || c.is_whitespace() {
            if !in_separator_run {
                stem.push('-');
            }
            in_separator_run = true;
        } else {
            stem.push(c);
            in_separator_run = false;
        }
    }

    if stem.is_empty() {
        stem.push_str(FALLBACK_STEM);
    }

    format!("{}.{}", stem, extension)
}

/// Handle on the shared download directory.
#[derive(Debug, Clone)]
pub struct DownloadStore {
    root: PathBuf,
}

impl DownloadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the download directory if needed.
    pub fn ensure_root(&self) -> BackendResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            BackendError::unavailable(format!(
                "Cannot create download directory {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    /// Pick the destination for a download.
    ///
    /// An explicit `filename` is used as given (the extension is appended
    /// when missing) but must stay inside the download directory.
    pub fn target_path(
        &self,
        title: &str,
        filename: Option<&str>,
        extension: &str,
    ) -> BackendResult<PathBuf> {
        self.ensure_root()?;

        let name = match filename.map(str::trim).filter(|f| !f.is_empty()) {
            Some(explicit) => {
                let suffix = format!(".{}", extension);
                if explicit.to_lowercase().ends_with(&suffix) {
                    explicit.to_string()
                } else {
                    format!("{}{}", explicit, suffix)
                }
            }
            None => derive_file_name(title, extension),
        };

        resolve_within_root(&self.root, &name)
            .map_err(|e| BackendError::invalid_input(e.to_string()))
    }

    /// Write `bytes` to `path`, replacing any existing file.
    pub fn write(&self, path: &Path, bytes: &[u8]) -> BackendResult<u64> {
        std::fs::write(path, bytes)?;
        info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(bytes.len() as u64)
    }

    /// Files in the download directory, newest first.
    pub fn list(&self) -> BackendResult<Vec<DownloadedFile>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Download directory {} does not exist yet", self.root.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }

            let modified: DateTime<Utc> = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH);

            files.push((
                modified,
                DownloadedFile {
                    filename: entry.file_name().to_string_lossy().into_owned(),
                    path: entry.path().display().to_string(),
                    size_bytes: metadata.len(),
                    modified: modified.to_rfc3339(),
                },
            ));
        }

        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.filename.cmp(&b.1.filename)));
        Ok(files.into_iter().map(|(_, file)| file).collect())
    }
}
