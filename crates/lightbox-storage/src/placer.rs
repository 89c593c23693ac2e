//! Artifact placement.
//!
//! Maps the artifacts of one upload onto object keys sharing the upload's
//! identity prefix and writes them in order. Writes are independent: a failed
//! write stops the sequence but leaves earlier objects in place.

use std::sync::Arc;

use lightbox_core::{Artifact, ArtifactKind, Folder, UniqueIdentity};
use thiserror::Error;

use crate::keys::object_key;
use crate::traits::{Storage, StorageError, StorageResult};

/// An artifact that was durably written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedArtifact {
    pub kind: ArtifactKind,
    pub folder: Folder,
    pub key: String,
    pub url: String,
}

/// A write in a sequence failed; `placed` holds what was written before it.
#[derive(Debug, Error)]
#[error("Failed to place {kind:?} artifact in {folder}: {source}")]
pub struct PlacementError {
    pub kind: ArtifactKind,
    pub folder: Folder,
    pub placed: Vec<PlacedArtifact>,
    #[source]
    pub source: StorageError,
}

#[derive(Clone)]
pub struct ArtifactPlacer {
    storage: Arc<dyn Storage>,
}

impl ArtifactPlacer {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Write a single artifact under `{folder}/{prefix}.{extension}`.
    pub async fn place(
        &self,
        identity: &UniqueIdentity,
        artifact: Artifact,
    ) -> StorageResult<PlacedArtifact> {
        let name = identity.object_name(&artifact.extension);
        let url = self
            .storage
            .put(artifact.folder, &name, artifact.data, &artifact.content_type)
            .await?;

        Ok(PlacedArtifact {
            kind: artifact.kind,
            folder: artifact.folder,
            key: object_key(artifact.folder, &name),
            url,
        })
    }

    /// Write artifacts in the given order, stopping at the first failure.
    pub async fn place_all(
        &self,
        identity: &UniqueIdentity,
        artifacts: Vec<Artifact>,
    ) -> Result<Vec<PlacedArtifact>, PlacementError> {
        let mut placed = Vec::with_capacity(artifacts.len());

        for artifact in artifacts {
            let (kind, folder) = (artifact.kind, artifact.folder);
            match self.place(identity, artifact).await {
                Ok(artifact) => placed.push(artifact),
                Err(source) => {
                    tracing::warn!(
                        prefix = %identity,
                        folder = %folder,
                        already_placed = placed.len(),
                        error = %source,
                        "Artifact write failed, earlier writes are kept"
                    );
                    return Err(PlacementError {
                        kind,
                        folder,
                        placed,
                        source,
                    });
                }
            }
        }

        Ok(placed)
    }

    /// URL an artifact of this upload has or would have, without touching the store.
    pub fn url_for(&self, folder: Folder, identity: &UniqueIdentity, extension: &str) -> String {
        self.storage.build_url(folder, &identity.object_name(extension))
    }
}
