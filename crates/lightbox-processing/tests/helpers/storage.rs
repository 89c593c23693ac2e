//! In-memory storage double with failure injection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use lightbox_core::{Folder, StorageBackend};
use lightbox_storage::keys::object_key;
use lightbox_storage::traits::sort_most_recent_first;
use lightbox_storage::{ObjectDescriptor, Storage, StorageError, StorageResult};

pub const BASE_URL: &str = "http://localhost:3000/media";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

/// Objects keyed by full key. Every write advances a fake clock by one
/// second so listing order is deterministic.
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    clock: AtomicI64,
    failing_folder: Option<Folder>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            clock: AtomicI64::new(1_700_000_000),
            failing_folder: None,
        }
    }

    /// Storage whose writes into `folder` always fail.
    pub fn failing_on(folder: Folder) -> Self {
        Self {
            failing_folder: Some(folder),
            ..Self::new()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn keys_in(&self, folder: Folder) -> Vec<String> {
        let prefix = format!("{}/", folder);
        self.keys()
            .into_iter()
            .filter(|key| key.starts_with(&prefix))
            .collect()
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(
        &self,
        folder: Folder,
        name: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        if self.failing_folder == Some(folder) {
            return Err(StorageError::UploadFailed(format!(
                "injected failure writing {}",
                object_key(folder, name)
            )));
        }

        let secs = self.clock.fetch_add(1, Ordering::SeqCst);
        let object = StoredObject {
            data,
            content_type: content_type.to_string(),
            last_modified: Utc.timestamp_opt(secs, 0).unwrap(),
        };
        self.objects
            .lock()
            .unwrap()
            .insert(object_key(folder, name), object);

        Ok(self.build_url(folder, name))
    }

    async fn get(&self, folder: Folder, name: &str) -> StorageResult<Vec<u8>> {
        let key = object_key(folder, name);
        self.object(&key)
            .map(|object| object.data.to_vec())
            .ok_or(StorageError::NotFound(key))
    }

    async fn list(&self, folder: Folder, max_keys: usize) -> StorageResult<Vec<ObjectDescriptor>> {
        let prefix = format!("{}/", folder);
        let mut listed: Vec<ObjectDescriptor> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, object)| ObjectDescriptor {
                key: key.clone(),
                folder,
                name: key[prefix.len()..].to_string(),
                size: object.data.len() as u64,
                last_modified: object.last_modified,
            })
            .collect();

        sort_most_recent_first(&mut listed);
        listed.truncate(max_keys);
        Ok(listed)
    }

    fn build_url(&self, folder: Folder, name: &str) -> String {
        format!("{}/{}", BASE_URL, object_key(folder, name))
    }

    async fn check_access(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
