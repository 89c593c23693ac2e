use crate::keys::{object_key, validate_object_name};
use crate::traits::{sort_most_recent_first, ObjectDescriptor, Storage, StorageError, StorageResult};
use crate::{Folder, StorageBackend};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{folder}/{name}` and are served from
/// `{base_url}/{folder}/{name}`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/lightbox")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:3000/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Filesystem path of `{folder}/{name}`, rejecting names that would leave the folder.
    fn object_path(&self, folder: Folder, name: &str) -> StorageResult<PathBuf> {
        validate_object_name(name)?;
        Ok(self.base_path.join(folder.as_str()).join(name))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        folder: Folder,
        name: &str,
        data: Bytes,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.object_path(folder, name)?;
        let key = object_key(folder, name);
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let url = self.generate_url(&key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(url)
    }

    async fn get(&self, folder: Folder, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.object_path(folder, name)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(object_key(folder, name)));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn list(&self, folder: Folder, max_keys: usize) -> StorageResult<Vec<ObjectDescriptor>> {
        let dir = self.base_path.join(folder.as_str());
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dir).await.map_err(|e| {
            StorageError::ListFailed(format!("Failed to read directory {}: {}", dir.display(), e))
        })?;

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let last_modified: DateTime<Utc> = metadata.modified()?.into();
            objects.push(ObjectDescriptor {
                key: object_key(folder, &name),
                folder,
                name,
                size: metadata.len(),
                last_modified,
            });
        }

        sort_most_recent_first(&mut objects);
        objects.truncate(max_keys);
        Ok(objects)
    }

    fn build_url(&self, folder: Folder, name: &str) -> String {
        self.generate_url(&object_key(folder, name))
    }

    async fn check_access(&self) -> StorageResult<()> {
        let metadata = fs::metadata(&self.base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Storage directory {} is not accessible: {}",
                self.base_path.display(),
                e
            ))
        })?;

        if !metadata.is_dir() || metadata.permissions().readonly() {
            return Err(StorageError::ConfigError(format!(
                "Storage directory {} is not writable",
                self.base_path.display()
            )));
        }

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
