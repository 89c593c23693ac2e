use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::upload::FileKind;

/// Ledger row tying a stored object key back to its source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub key: String,
    pub original_filename: String,
    pub file_kind: FileKind,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
