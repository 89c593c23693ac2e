pub mod gallery;
pub mod mapping;
pub mod raw;
pub mod upload;

pub use gallery::GalleryEntry;
pub use mapping::MappingEntry;
pub use raw::RawMetadata;
pub use upload::{
    Artifact, ArtifactKind, ClassifiedFile, FileKind, UniqueIdentity, UploadOutcome,
    UploadReceipt, UploadRequest,
};
