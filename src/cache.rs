//! Write-through transcription cache.
//!
//! Every resolved transcription is persisted immediately, so an interrupted
//! run can be restarted without fetching anything twice.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::transcription::{Transcription, TranscriptionRecord};

/// File name of the cache inside the cache directory.
pub const CACHE_FILE_NAME: &str = "transcriptions.json";

/// Transcriptions keyed by post ID, backed by a JSON file.
#[derive(Debug)]
pub struct TranscriptionCache {
    path: PathBuf,
    entries: IndexMap<String, Transcription>,
}

impl TranscriptionCache {
    /// Create an empty cache that will persist to `path`.
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: IndexMap::new(),
        }
    }

    /// Load the cache from `path`.
    ///
    /// A missing, unreadable or malformed file yields an empty cache.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No transcription cache yet");
                return Self::empty(path);
            }
            Err(e) => {
                warn!(path = %path.display(), "Failed to read transcription cache, starting empty: {e}");
                return Self::empty(path);
            }
        };

        let records: IndexMap<String, TranscriptionRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(path = %path.display(), "Malformed transcription cache, starting empty: {e}");
                return Self::empty(path);
            }
        };

        let entries = records
            .into_iter()
            .map(|(post_id, record)| (post_id, Transcription::from_record(record)))
            .collect::<IndexMap<_, _>>();

        debug!(path = %path.display(), entries = entries.len(), "Loaded transcription cache");
        Self { path, entries }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn get(&self, post_id: &str) -> Option<&Transcription> {
        self.entries.get(post_id)
    }

    #[must_use]
    pub fn contains(&self, post_id: &str) -> bool {
        self.entries.contains_key(post_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace an entry and persist the whole cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache file cannot be written. Callers must not
    /// ignore this, since later entries would be lost on the next crash.
    pub async fn put(&mut self, post_id: &str, transcription: Transcription) -> Result<()> {
        self.entries.insert(post_id.to_string(), transcription);
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        let records: IndexMap<&str, TranscriptionRecord> = self
            .entries
            .iter()
            .map(|(post_id, tr)| (post_id.as_str(), tr.to_record()))
            .collect();
        let json =
            serde_json::to_string_pretty(&records).context("Failed to serialize transcription cache")?;

        // Write next to the target and rename, so a crash never leaves a truncated cache.
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await.with_context(|| {
            format!("Failed to write transcription cache: {}", tmp_path.display())
        })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| {
                format!("Failed to replace transcription cache: {}", self.path.display())
            })?;

        Ok(())
    }
}
