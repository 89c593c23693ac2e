//! Ledger service.
//!
//! The document is loaded on first use and kept in memory behind a single
//! async mutex. `record` is a read-modify-write of the whole document: the
//! lock is held across the file write, so concurrent recorders are serialized
//! and no update is lost. A new document is written to a temporary file and
//! renamed over the old one; memory is only updated once that succeeds, so a
//! failed write leaves both copies at the previous state.
//!
//! Entries are recorded only after an upload's objects are stored. A crash in
//! between leaves stored objects without an entry, never an entry without its
//! objects.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use lightbox_core::{AppError, FileKind, MappingEntry};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::document::{LedgerDocument, MappingRecord};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No mapping recorded for key: {0}")]
    NotFound(String),

    #[error("Ledger I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger document {path} is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize ledger document: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(key) => AppError::NotFound(format!("No mapping for {}", key)),
            other => AppError::Internal(other.to_string()),
        }
    }
}

pub struct FileMappingLedger {
    path: PathBuf,
    state: Mutex<Option<LedgerDocument>>,
}

impl FileMappingLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record (or replace) the mapping for `key`.
    #[tracing::instrument(skip(self, url), fields(ledger.operation = "record"))]
    pub async fn record(
        &self,
        key: &str,
        original_filename: &str,
        file_kind: FileKind,
        url: &str,
    ) -> LedgerResult<MappingEntry> {
        let mut guard = self.state.lock().await;
        let current = self.loaded(&mut guard).await?;

        let now = Utc::now();
        let record = MappingRecord {
            original_filename: original_filename.to_string(),
            file_url: url.to_string(),
            file_type: file_kind,
            mapped_at: now,
        };
        let entry = record.to_entry(key);

        let mut next = current.clone();
        next.file_mappings.insert(key.to_string(), record);
        next.last_updated = Some(now);

        self.persist(&next).await?;
        *current = next;

        tracing::debug!(
            key = %key,
            entries = current.file_mappings.len(),
            "Mapping recorded"
        );

        Ok(entry)
    }

    #[tracing::instrument(skip(self), fields(ledger.operation = "lookup"))]
    pub async fn lookup(&self, key: &str) -> LedgerResult<MappingEntry> {
        let mut guard = self.state.lock().await;
        let document = self.loaded(&mut guard).await?;

        document
            .file_mappings
            .get(key)
            .map(|record| record.to_entry(key))
            .ok_or_else(|| LedgerError::NotFound(key.to_string()))
    }

    /// Up to `limit` entries, most recently mapped first.
    pub async fn list_all(&self, limit: usize) -> LedgerResult<Vec<MappingEntry>> {
        let mut guard = self.state.lock().await;
        let document = self.loaded(&mut guard).await?;

        let mut entries = document.entries_most_recent_first();
        entries.truncate(limit);
        Ok(entries)
    }

    /// Copy of every entry keyed by object key, taken under the lock.
    pub async fn snapshot(&self) -> LedgerResult<BTreeMap<String, MappingEntry>> {
        let mut guard = self.state.lock().await;
        let document = self.loaded(&mut guard).await?;

        Ok(document
            .file_mappings
            .iter()
            .map(|(key, record)| (key.clone(), record.to_entry(key)))
            .collect())
    }

    pub async fn len(&self) -> LedgerResult<usize> {
        let mut guard = self.state.lock().await;
        Ok(self.loaded(&mut guard).await?.file_mappings.len())
    }

    pub async fn is_empty(&self) -> LedgerResult<bool> {
        Ok(self.len().await? == 0)
    }

    async fn loaded<'a>(
        &self,
        slot: &'a mut Option<LedgerDocument>,
    ) -> LedgerResult<&'a mut LedgerDocument> {
        if slot.is_none() {
            let document = self.read_document().await?;
            tracing::info!(
                path = %self.path.display(),
                entries = document.file_mappings.len(),
                "Ledger loaded"
            );
            *slot = Some(document);
        }
        Ok(slot.get_or_insert_with(LedgerDocument::default))
    }

    async fn read_document(&self) -> LedgerResult<LedgerDocument> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LedgerDocument::default())
            }
            Err(source) => {
                return Err(LedgerError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| LedgerError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn persist(&self, document: &LedgerDocument) -> LedgerResult<()> {
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        let bytes = serde_json::to_vec_pretty(document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(io_err)?;

        Ok(())
    }
}
