//! Upload pipeline.
//!
//! One upload runs strictly in order:
//!
//! - RAW: classify, size check, identity, store the RAW original, decode,
//!   build derivatives, store processed JPEG, store thumbnail, record mapping.
//! - Regular: classify, size check, identity, build thumbnail, store original,
//!   store thumbnail, record mapping.
//!
//! Rejections happen before anything is written. After the first write,
//! failures leave whatever was stored in place and are reported with enough
//! detail (stored RAW URL, written keys) to find it again. The mapping is only
//! recorded once every object of the upload is stored.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use lightbox_core::constants::{DERIVATIVE_CONTENT_TYPE, DERIVATIVE_EXTENSION};
use lightbox_core::{
    AppError, Artifact, ArtifactKind, ClassifiedFile, FileKind, Folder, RawMetadata,
    UniqueIdentity, UploadReceipt, UploadRequest, UploadSettings,
};
use lightbox_db::FileMappingLedger;
use lightbox_storage::{ArtifactPlacer, PlacedArtifact, PlacementError, Storage};

use crate::classifier::{check_size, classify, normalize_content_type};
use crate::error::{run_blocking, ProcessingError};
use crate::identity::IdentityGenerator;
use crate::image::DerivativeBuilder;
use crate::raw::RawDecoder;

const SUCCESS_MESSAGE: &str = "File uploaded successfully";
const RAW_SUCCESS_MESSAGE: &str = "RAW file uploaded and processed successfully";
const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Clone)]
pub struct UploadPipeline {
    placer: ArtifactPlacer,
    ledger: Arc<FileMappingLedger>,
    decoder: Arc<dyn RawDecoder>,
    derivatives: DerivativeBuilder,
    identity: IdentityGenerator,
    settings: UploadSettings,
}

impl UploadPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        ledger: Arc<FileMappingLedger>,
        decoder: Arc<dyn RawDecoder>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            placer: ArtifactPlacer::new(storage),
            ledger,
            decoder,
            derivatives: DerivativeBuilder::new(&settings),
            identity: IdentityGenerator,
            settings,
        }
    }

    /// Pipeline decoding RAW files with rawloader.
    #[cfg(feature = "raw")]
    pub fn with_default_decoder(
        storage: Arc<dyn Storage>,
        ledger: Arc<FileMappingLedger>,
        settings: UploadSettings,
    ) -> Self {
        Self::new(
            storage,
            ledger,
            Arc::new(crate::raw::RawloaderDecoder),
            settings,
        )
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        self.placer.storage()
    }

    pub fn ledger(&self) -> &Arc<FileMappingLedger> {
        &self.ledger
    }

    #[tracing::instrument(
        skip(self, request),
        fields(
            filename = %request.filename,
            size_bytes = request.data.len(),
            file_kind = tracing::field::Empty,
            prefix = tracing::field::Empty,
        )
    )]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, AppError> {
        let start = Instant::now();
        let UploadRequest {
            filename,
            content_type,
            data,
        } = request;

        let file = classify(&filename, content_type.as_deref(), &data).inspect_err(|e| {
            tracing::info!(error = %e, "Upload rejected");
        })?;
        check_size(&file, &self.settings).inspect_err(|e| {
            tracing::info!(error = %e, "Upload rejected");
        })?;

        let identity = self.identity.generate();
        let span = tracing::Span::current();
        span.record("file_kind", file.kind.as_str());
        span.record("prefix", tracing::field::display(&identity));

        let data = Bytes::from(data);
        let declared = normalize_content_type(content_type.as_deref());

        let result = match file.kind {
            FileKind::Raw => self.upload_raw(&file, &identity, data, declared).await,
            FileKind::Regular => self.upload_regular(&file, &identity, data, declared).await,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(receipt) => tracing::info!(
                key = %receipt.key(),
                duration_ms = duration_ms,
                "Upload completed"
            ),
            Err(e) => tracing::error!(
                error = %e,
                duration_ms = duration_ms,
                "Upload failed"
            ),
        }

        result
    }

    async fn upload_raw(
        &self,
        file: &ClassifiedFile,
        identity: &UniqueIdentity,
        data: Bytes,
        declared: Option<String>,
    ) -> Result<UploadReceipt, AppError> {
        // The original goes first so it survives a failed conversion.
        let original = self
            .placer
            .place(
                identity,
                Artifact {
                    kind: ArtifactKind::Original,
                    folder: Folder::Raw,
                    extension: file.extension.clone(),
                    content_type: declared.unwrap_or_else(|| GENERIC_CONTENT_TYPE.to_string()),
                    data: data.clone(),
                },
            )
            .await
            .map_err(|e| AppError::Storage {
                message: format!("Failed to store RAW original: {}", e),
                folder: Some(Folder::Raw),
                written: Vec::new(),
            })?;

        let decoder = Arc::clone(&self.decoder);
        let builder = self.derivatives;
        let extension = file.extension.clone();
        let (metadata, derivatives) = run_blocking(move || {
            let decoded = decoder.decode(&data, &extension)?;
            tracing::debug!(
                width = decoded.width(),
                height = decoded.height(),
                "RAW file decoded"
            );
            let derivatives = builder.from_decoded(&decoded)?;
            Ok::<_, ProcessingError>((decoded.metadata, derivatives))
        })
        .await
        .map_err(|e| {
            tracing::warn!(
                raw_key = %original.key,
                error = %e,
                "RAW conversion failed, original kept"
            );
            e.into_app_error(Some(&original.url))
        })?;

        let placed = self
            .placer
            .place_all(
                identity,
                vec![
                    derivative(ArtifactKind::Processed, Folder::Processed, derivatives.processed),
                    derivative(ArtifactKind::Thumbnail, Folder::Thumbnails, derivatives.thumbnail),
                ],
            )
            .await
            .map_err(|e| placement_failure(e, Some(&original)))?;

        let processed_url = url_of(&placed, ArtifactKind::Processed).unwrap_or_else(|| {
            self.placer
                .url_for(Folder::Processed, identity, DERIVATIVE_EXTENSION)
        });
        let thumbnail_url = url_of(&placed, ArtifactKind::Thumbnail).unwrap_or_else(|| {
            self.placer
                .url_for(Folder::Thumbnails, identity, DERIVATIVE_EXTENSION)
        });

        self.record(&original, file).await?;

        Ok(raw_receipt(file, original, processed_url, thumbnail_url, metadata))
    }

    async fn upload_regular(
        &self,
        file: &ClassifiedFile,
        identity: &UniqueIdentity,
        data: Bytes,
        declared: Option<String>,
    ) -> Result<UploadReceipt, AppError> {
        let builder = self.derivatives;
        let source = data.clone();
        let thumbnail = run_blocking(move || Ok(builder.from_regular(&source)?))
            .await
            .map_err(|e| e.into_app_error(None))?;

        let content_type = declared
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or_else(|| mime_for_extension(&file.extension));

        let placed = self
            .placer
            .place_all(
                identity,
                vec![
                    Artifact {
                        kind: ArtifactKind::Original,
                        folder: Folder::Uploads,
                        extension: file.extension.clone(),
                        content_type,
                        data,
                    },
                    derivative(ArtifactKind::Thumbnail, Folder::Thumbnails, thumbnail),
                ],
            )
            .await
            .map_err(|e| placement_failure(e, None))?;

        let original = placed
            .iter()
            .find(|a| a.kind == ArtifactKind::Original)
            .cloned()
            .ok_or_else(|| AppError::Internal("Original artifact was not placed".to_string()))?;
        let thumbnail_url = url_of(&placed, ArtifactKind::Thumbnail).unwrap_or_else(|| {
            self.placer
                .url_for(Folder::Thumbnails, identity, DERIVATIVE_EXTENSION)
        });

        self.record(&original, file).await?;

        Ok(UploadReceipt::Regular {
            message: SUCCESS_MESSAGE.to_string(),
            filename: file.filename.clone(),
            key: original.key,
            image_url: original.url,
            thumbnail_url,
        })
    }

    /// Map the original artifact's key back to the client's filename.
    async fn record(
        &self,
        original: &PlacedArtifact,
        file: &ClassifiedFile,
    ) -> Result<(), AppError> {
        self.ledger
            .record(&original.key, &file.filename, file.kind, &original.url)
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::error!(
                    key = %original.key,
                    error = %e,
                    "Objects stored but mapping not recorded"
                );
                AppError::Ledger {
                    key: original.key.clone(),
                    message: e.to_string(),
                }
            })
    }
}

fn derivative(kind: ArtifactKind, folder: Folder, data: Vec<u8>) -> Artifact {
    Artifact {
        kind,
        folder,
        extension: DERIVATIVE_EXTENSION.to_string(),
        content_type: DERIVATIVE_CONTENT_TYPE.to_string(),
        data: Bytes::from(data),
    }
}

fn url_of(placed: &[PlacedArtifact], kind: ArtifactKind) -> Option<String> {
    placed.iter().find(|a| a.kind == kind).map(|a| a.url.clone())
}

fn placement_failure(err: PlacementError, stored_before: Option<&PlacedArtifact>) -> AppError {
    let written = stored_before
        .into_iter()
        .chain(err.placed.iter())
        .map(|a| a.key.clone())
        .collect();

    AppError::Storage {
        message: err.to_string(),
        folder: Some(err.folder),
        written,
    }
}

fn mime_for_extension(extension: &str) -> String {
    image::ImageFormat::from_extension(extension)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|| GENERIC_CONTENT_TYPE.to_string())
}

fn raw_receipt(
    file: &ClassifiedFile,
    original: PlacedArtifact,
    processed_url: String,
    thumbnail_url: String,
    metadata: RawMetadata,
) -> UploadReceipt {
    UploadReceipt::Raw {
        message: RAW_SUCCESS_MESSAGE.to_string(),
        filename: file.filename.clone(),
        key: original.key,
        raw_url: original.url,
        processed_url,
        thumbnail_url,
        metadata,
    }
}
