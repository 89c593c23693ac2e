use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage_types::Folder;

/// One row of the gallery listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryEntry {
    pub key: String,
    /// Original filename from the ledger, or the object name when unmapped.
    pub filename: String,
    pub folder: Folder,
    pub is_raw: bool,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Displayable image: the original for regular uploads, the processed
    /// JPEG for RAW.
    pub url: String,
    pub thumbnail_url: String,
    pub original_url: Option<String>,
    pub raw_original_url: Option<String>,
    /// Whether the derivatives were written. Derivative URLs follow the
    /// naming convention either way; when this is false, `thumbnail_url` (and
    /// `url` of a RAW entry) point at objects that do not exist, as happens
    /// after a failed RAW conversion.
    pub has_derivatives: bool,
}
