//! Gallery listing.
//!
//! Read-only view over the `uploads` and `raw` folders. Derivative URLs are
//! derived from the naming convention; the `thumbnails` folder is listed only
//! to tell whether they exist. Filenames come from one ledger snapshot per
//! call. Every call re-queries the store.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use lightbox_core::constants::{
    DEFAULT_LIST_LIMIT, DERIVATIVE_EXTENSION, MAX_LIST_LIMIT, MIN_LIST_LIMIT,
};
use lightbox_core::{AppError, Folder, GalleryEntry, MappingEntry};
use lightbox_db::FileMappingLedger;
use lightbox_storage::keys::with_extension;
use lightbox_storage::traits::sort_most_recent_first;
use lightbox_storage::{ObjectDescriptor, Storage};

/// Folders holding upload originals.
const LISTED_FOLDERS: [Folder; 2] = [Folder::Uploads, Folder::Raw];

/// Clamp a requested listing size to the accepted range.
pub fn clamp_limit(limit: Option<i64>) -> usize {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(MIN_LIST_LIMIT, MAX_LIST_LIMIT) as usize
}

#[derive(Clone)]
pub struct GalleryLister {
    storage: Arc<dyn Storage>,
    ledger: Arc<FileMappingLedger>,
}

impl GalleryLister {
    pub fn new(storage: Arc<dyn Storage>, ledger: Arc<FileMappingLedger>) -> Self {
        Self { storage, ledger }
    }

    /// Most recently modified uploads first, at most `limit` of them.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<GalleryEntry>, AppError> {
        let limit = clamp_limit(limit);

        let mut objects = Vec::new();
        for folder in LISTED_FOLDERS {
            objects.extend(self.list_folder(folder, limit).await?);
        }

        sort_most_recent_first(&mut objects);
        objects.truncate(limit);

        // Thumbnails are written last, so one marks a fully processed upload.
        let thumbnails: HashSet<String> = self
            .list_folder(Folder::Thumbnails, usize::MAX)
            .await?
            .into_iter()
            .map(|object| object.name)
            .collect();

        let mappings = match self.ledger.snapshot().await {
            Ok(mappings) => mappings,
            Err(e) => {
                tracing::warn!(error = %e, "Listing without original filenames");
                BTreeMap::new()
            }
        };

        let entries: Vec<GalleryEntry> = objects
            .into_iter()
            .map(|object| self.entry(object, &mappings, &thumbnails))
            .collect();

        tracing::debug!(count = entries.len(), limit = limit, "Gallery listed");
        Ok(entries)
    }

    async fn list_folder(
        &self,
        folder: Folder,
        max_keys: usize,
    ) -> Result<Vec<ObjectDescriptor>, AppError> {
        self.storage
            .list(folder, max_keys)
            .await
            .map_err(|e| AppError::Storage {
                message: format!("Failed to list {}: {}", folder, e),
                folder: Some(folder),
                written: Vec::new(),
            })
    }

    fn entry(
        &self,
        object: ObjectDescriptor,
        mappings: &BTreeMap<String, MappingEntry>,
        thumbnails: &HashSet<String>,
    ) -> GalleryEntry {
        let derivative = with_extension(&object.name, DERIVATIVE_EXTENSION);
        let has_derivatives = thumbnails.contains(&derivative);
        let object_url = self.storage.build_url(object.folder, &object.name);
        let thumbnail_url = self.storage.build_url(Folder::Thumbnails, &derivative);
        let is_raw = object.folder == Folder::Raw;

        let (url, original_url, raw_original_url) = if is_raw {
            let processed_url = self.storage.build_url(Folder::Processed, &derivative);
            (processed_url, None, Some(object_url))
        } else {
            (object_url.clone(), Some(object_url), None)
        };

        let filename = mappings
            .get(&object.key)
            .map(|mapping| mapping.original_filename.clone())
            .unwrap_or_else(|| object.name.clone());

        GalleryEntry {
            key: object.key,
            filename,
            folder: object.folder,
            is_raw,
            size: object.size,
            last_modified: object.last_modified,
            url,
            thumbnail_url,
            original_url,
            raw_original_url,
            has_derivatives,
        }
    }
}
