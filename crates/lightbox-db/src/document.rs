//! On-disk layout of the ledger.
//!
//! ```json
//! {
//!   "file_mappings": {
//!     "raw/20240102_030405_abcdef012345.cr2": {
//!       "original_filename": "IMG_001.CR2",
//!       "file_url": "https://photos.s3.amazonaws.com/raw/20240102_030405_abcdef012345.cr2",
//!       "file_type": "raw",
//!       "mapped_at": "2024-01-02T03:04:05Z"
//!     }
//!   },
//!   "last_updated": "2024-01-02T03:04:05Z"
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use lightbox_core::{FileKind, MappingEntry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    pub original_filename: String,
    pub file_url: String,
    pub file_type: FileKind,
    pub mapped_at: DateTime<Utc>,
}

impl MappingRecord {
    pub fn to_entry(&self, key: &str) -> MappingEntry {
        MappingEntry {
            key: key.to_string(),
            original_filename: self.original_filename.clone(),
            file_kind: self.file_type,
            url: self.file_url.clone(),
            created_at: self.mapped_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub file_mappings: BTreeMap<String, MappingRecord>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl LedgerDocument {
    /// Entries ordered most recently mapped first, ties broken by key.
    pub fn entries_most_recent_first(&self) -> Vec<MappingEntry> {
        let mut entries: Vec<MappingEntry> = self
            .file_mappings
            .iter()
            .map(|(key, record)| record.to_entry(key))
            .collect();
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.key.cmp(&b.key))
        });
        entries
    }
}
