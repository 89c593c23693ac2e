//! RAW decoder doubles.

use image::{Rgb, RgbImage};
use lightbox_core::RawMetadata;
use lightbox_processing::{DecodedImage, RawDecodeError, RawDecoder};

pub struct StubRawDecoder {
    dimensions: Option<(u32, u32)>,
}

impl StubRawDecoder {
    /// Decodes any input into a flat frame of the given size.
    pub fn succeeding(width: u32, height: u32) -> Self {
        Self {
            dimensions: Some((width, height)),
        }
    }

    pub fn failing() -> Self {
        Self { dimensions: None }
    }
}

impl RawDecoder for StubRawDecoder {
    fn decode(&self, _data: &[u8], extension: &str) -> Result<DecodedImage, RawDecodeError> {
        let (width, height) = self
            .dimensions
            .ok_or_else(|| RawDecodeError::Unreadable(format!("stub cannot read .{}", extension)))?;

        Ok(DecodedImage {
            image: RgbImage::from_pixel(width, height, Rgb([90, 120, 150])),
            metadata: RawMetadata {
                width,
                height,
                colors: 3,
                raw_type: "flat".to_string(),
                color_desc: "RGGB".to_string(),
                black_level: 512,
                white_level: 16383,
                camera_whitebalance: vec![2.1, 1.0, 1.6, 0.0],
                daylight_whitebalance: vec![2.0, 1.0, 1.5, 0.0],
                make: Some("Canon".to_string()),
                model: Some("EOS 5D Mark IV".to_string()),
            },
        })
    }
}
