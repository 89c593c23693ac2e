//! Lightbox Core Library
//!
//! This crate provides the domain models, error taxonomy and configuration
//! shared by every Lightbox component: the storage backends, the mapping
//! ledger and the upload pipeline.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, LightboxConfig, UploadSettings};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    Artifact, ArtifactKind, ClassifiedFile, FileKind, GalleryEntry, MappingEntry, RawMetadata,
    UniqueIdentity, UploadOutcome, UploadReceipt, UploadRequest,
};
pub use storage_types::{Folder, StorageBackend};
