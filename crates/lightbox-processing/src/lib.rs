//! Lightbox upload processing
//!
//! Everything between receiving an upload's bytes and recording where they
//! ended up:
//! - format classification and size limits (classifier)
//! - key prefix generation (identity)
//! - camera RAW decoding (raw)
//! - JPEG derivative encoding (image)
//! - the end-to-end upload flow (upload)
//! - the gallery listing (listing)

pub mod classifier;
pub mod error;
pub mod identity;
pub mod image;
pub mod listing;
pub mod raw;
pub mod upload;

pub use classifier::{check_size, classify, is_raw_extension, RAW_EXTENSIONS};
pub use error::ProcessingError;
pub use identity::IdentityGenerator;
pub use crate::image::{DerivativeBuilder, DerivativeError, RawDerivatives};
pub use listing::{clamp_limit, GalleryLister};
#[cfg(feature = "raw")]
pub use raw::RawloaderDecoder;
pub use raw::{DecodedImage, RawDecodeError, RawDecoder};
pub use upload::UploadPipeline;
