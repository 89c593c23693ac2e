//! Derivative builder.
//!
//! RAW uploads get a processed JPEG and a thumbnail developed from the same
//! pixel buffer. Regular uploads only get a thumbnail: their original bytes
//! are served as-is, and their thumbnail honours the EXIF orientation tag.
//! Output depends only on the input pixels and settings.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use lightbox_core::UploadSettings;

use crate::raw::DecodedImage;

#[derive(Debug, thiserror::Error)]
pub enum DerivativeError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// Encoded derivatives of a RAW upload.
#[derive(Debug, Clone)]
pub struct RawDerivatives {
    pub processed: Vec<u8>,
    pub thumbnail: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativeBuilder {
    jpeg_quality: u8,
    thumbnail_quality: u8,
    thumbnail_max_edge: u32,
    processed_max_edge: Option<u32>,
}

impl DerivativeBuilder {
    pub fn new(settings: &UploadSettings) -> Self {
        Self {
            jpeg_quality: settings.jpeg_quality,
            thumbnail_quality: settings.thumbnail_quality,
            thumbnail_max_edge: settings.thumbnail_max_edge,
            processed_max_edge: settings.processed_max_edge,
        }
    }

    /// Processed JPEG and thumbnail from a developed RAW frame.
    pub fn from_decoded(&self, decoded: &DecodedImage) -> Result<RawDerivatives, DerivativeError> {
        let processed = match self.processed_max_edge {
            Some(max_edge) => encode_jpeg(&shrink(&decoded.image, max_edge), self.jpeg_quality)?,
            None => encode_jpeg(&decoded.image, self.jpeg_quality)?,
        };
        let thumbnail = encode_jpeg(
            &shrink(&decoded.image, self.thumbnail_max_edge),
            self.thumbnail_quality,
        )?;

        Ok(RawDerivatives {
            processed,
            thumbnail,
        })
    }

    /// Thumbnail of a regular image given its original bytes.
    pub fn from_regular(&self, data: &[u8]) -> Result<Vec<u8>, DerivativeError> {
        let mut decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_decoder()
            .map_err(DerivativeError::Decode)?;
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let mut image = DynamicImage::from_decoder(decoder).map_err(DerivativeError::Decode)?;
        image.apply_orientation(orientation);

        let rgb = flatten(image);
        encode_jpeg(&shrink(&rgb, self.thumbnail_max_edge), self.thumbnail_quality)
    }
}

/// Size that fits within `max_edge` on the longest side, keeping aspect ratio.
/// Never upscales.
pub fn bounded_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge || longest == 0 {
        return (width, height);
    }

    let ratio = max_edge as f64 / longest as f64;
    let scaled = |v: u32| ((v as f64 * ratio).round() as u32).clamp(1, max_edge);
    (scaled(width), scaled(height))
}

fn shrink(image: &RgbImage, max_edge: u32) -> RgbImage {
    let (width, height) = bounded_dimensions(image.width(), image.height(), max_edge);
    if (width, height) == image.dimensions() {
        return image.clone();
    }
    image::imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// JPEG has no alpha channel; composite transparent pixels onto white.
fn flatten(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, DerivativeError> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(image)
        .map_err(DerivativeError::Encode)?;
    Ok(buffer)
}
