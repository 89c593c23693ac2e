//! Lightbox Storage Library
//!
//! Object-store abstraction for upload artifacts, with S3 and local
//! filesystem backends.
//!
//! # Storage key format
//!
//! Every object key is `{folder}/{name}` where folder is one of `uploads`,
//! `raw`, `processed` or `thumbnails` and name is `{timestamp}_{token}.{ext}`.
//! All artifacts of one upload share the `{timestamp}_{token}` prefix, so a
//! derivative can be located from any sibling without consulting the ledger.
//!
//! Names must not contain `/`, `..` or be empty. Key construction lives in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod placer;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use lightbox_core::{Folder, StorageBackend};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use placer::{ArtifactPlacer, PlacedArtifact, PlacementError};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectDescriptor, Storage, StorageError, StorageResult};
