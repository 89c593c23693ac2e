//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::{Folder, StorageBackend};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A stored object as reported by a backend listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Full key, `{folder}/{name}`.
    pub key: String,
    pub folder: Folder,
    /// Key without the folder prefix.
    pub name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Sort descriptors most recently modified first, breaking ties by key.
pub fn sort_most_recent_first(objects: &mut [ObjectDescriptor]) {
    objects.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.key.cmp(&b.key))
    });
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// The upload pipeline only ever addresses objects by `(folder, name)`; key
/// layout is owned by the `keys` module.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `{folder}/{name}` and return its public URL.
    async fn put(
        &self,
        folder: Folder,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Read an object back.
    async fn get(&self, folder: Folder, name: &str) -> StorageResult<Vec<u8>>;

    /// List up to `max_keys` objects of a folder, most recently modified
    /// first (ties broken by key).
    async fn list(&self, folder: Folder, max_keys: usize) -> StorageResult<Vec<ObjectDescriptor>>;

    /// Public URL of `{folder}/{name}`. Pure: no network call, no existence check.
    fn build_url(&self, folder: Folder, name: &str) -> String;

    /// Verify the backend is reachable with the configured credentials.
    async fn check_access(&self) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn descriptor(key: &str, secs: i64) -> ObjectDescriptor {
        ObjectDescriptor {
            key: key.to_string(),
            folder: Folder::Uploads,
            name: key.trim_start_matches("uploads/").to_string(),
            size: 1,
            last_modified: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_sort_most_recent_first_with_key_tie_break() {
        let mut objects = vec![
            descriptor("uploads/b.jpg", 10),
            descriptor("uploads/c.jpg", 20),
            descriptor("uploads/a.jpg", 10),
        ];
        sort_most_recent_first(&mut objects);
        let keys: Vec<&str> = objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["uploads/c.jpg", "uploads/a.jpg", "uploads/b.jpg"]);
    }
}
