//! Camera RAW decoding.
//!
//! `RawDecoder` turns the bytes of a RAW file into a full-resolution RGB
//! buffer plus the sensor metadata found in the file. Decoding is CPU-bound
//! and synchronous; callers run it on a blocking thread.

#[cfg(feature = "raw")]
mod cr3;
pub mod develop;
#[cfg(feature = "raw")]
mod loader;

use image::RgbImage;
use lightbox_core::RawMetadata;

#[cfg(feature = "raw")]
pub use loader::RawloaderDecoder;

#[derive(Debug, thiserror::Error)]
pub enum RawDecodeError {
    #[error("Unreadable RAW data: {0}")]
    Unreadable(String),

    #[error("Unsupported sensor layout: {0}")]
    UnsupportedLayout(String),
}

/// A developed RAW frame.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: RgbImage,
    pub metadata: RawMetadata,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Turn a developed frame upright given its EXIF orientation value (1-8).
/// Unknown values leave the frame as stored.
#[cfg(feature = "raw")]
fn upright(image: RgbImage, exif_orientation: u8) -> RgbImage {
    use image::metadata::Orientation;
    use image::DynamicImage;

    match Orientation::from_exif(exif_orientation) {
        None | Some(Orientation::NoTransforms) => image,
        Some(orientation) => {
            let mut image = DynamicImage::ImageRgb8(image);
            image.apply_orientation(orientation);
            image.into_rgb8()
        }
    }
}

pub trait RawDecoder: Send + Sync {
    /// Decode `data`, a file with the given lowercase RAW extension.
    fn decode(&self, data: &[u8], extension: &str) -> Result<DecodedImage, RawDecodeError>;
}
