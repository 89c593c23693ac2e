use std::io::Cursor;

use image::ImageFormat;
use lightbox_core::RawMetadata;
use rawloader::{Orientation, RawImage, RawImageData};

use super::develop::{
    camera_to_srgb, develop, select_white_balance, CfaPattern, Crop, Samples, SensorFrame,
};
use super::{cr3, upright, DecodedImage, RawDecodeError, RawDecoder};

/// EXIF orientation value (1-8) for a rawloader orientation.
fn exif_orientation(orientation: Orientation) -> u8 {
    match orientation {
        Orientation::Normal | Orientation::Unknown => 1,
        Orientation::HorizontalFlip => 2,
        Orientation::Rotate180 => 3,
        Orientation::VerticalFlip => 4,
        Orientation::Transpose => 5,
        Orientation::Rotate90 => 6,
        Orientation::Transverse => 7,
        Orientation::Rotate270 => 8,
    }
}

/// Decoder backed by the `rawloader` container and sensor parsers. Canon CR3
/// files, which `rawloader` cannot read, are rendered from their embedded
/// full-size JPEG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawloaderDecoder;

impl RawloaderDecoder {
    fn cfa_pattern(raw: &RawImage) -> Option<CfaPattern> {
        let (width, height) = (raw.cfa.width, raw.cfa.height);
        if raw.cpp != 1 || width == 0 || height == 0 {
            return None;
        }
        let colors = (0..height)
            .flat_map(|row| (0..width).map(move |col| (row, col)))
            .map(|(row, col)| raw.cfa.color_at(row, col) as u8)
            .collect();
        Some(CfaPattern {
            width,
            height,
            colors,
        })
    }

    fn metadata(
        raw: &RawImage,
        cfa: Option<&CfaPattern>,
        width: u32,
        height: u32,
    ) -> RawMetadata {
        let (colors, color_desc) = match cfa {
            Some(cfa) => (cfa.color_count(), cfa.name()),
            None => (raw.cpp as u32, "RGB".to_string()),
        };

        RawMetadata {
            width,
            height,
            colors,
            raw_type: if raw.cpp == 1 { "flat" } else { "stack" }.to_string(),
            color_desc,
            black_level: raw.blacklevels[0],
            white_level: raw.whitelevels[0],
            camera_whitebalance: raw.wb_coeffs.to_vec(),
            daylight_whitebalance: raw.neutralwb().to_vec(),
            make: Some(raw.clean_make.clone()).filter(|s| !s.is_empty()),
            model: Some(raw.clean_model.clone()).filter(|s| !s.is_empty()),
        }
    }

    fn decode_cr3(data: &[u8], extension: &str) -> Result<DecodedImage, RawDecodeError> {
        let file = cr3::parse(data)?;
        let rendering = image::load_from_memory_with_format(file.jpeg, ImageFormat::Jpeg)
            .map_err(|e| RawDecodeError::Unreadable(format!("CR3 preview: {}", e)))?;
        let image = upright(rendering.into_rgb8(), file.orientation.unwrap_or(1));

        tracing::debug!(
            extension = %extension,
            make = ?file.make,
            model = ?file.model,
            width = image.width(),
            height = image.height(),
            "CR3 rendered from embedded JPEG"
        );

        let metadata = RawMetadata {
            width: image.width(),
            height: image.height(),
            colors: 3,
            raw_type: "embedded".to_string(),
            color_desc: "RGB".to_string(),
            black_level: 0,
            white_level: u8::MAX as u16,
            camera_whitebalance: Vec::new(),
            daylight_whitebalance: Vec::new(),
            make: file.make,
            model: file.model,
        };
        Ok(DecodedImage { image, metadata })
    }
}

impl RawDecoder for RawloaderDecoder {
    fn decode(&self, data: &[u8], extension: &str) -> Result<DecodedImage, RawDecodeError> {
        if extension == "cr3" || cr3::is_cr3(data) {
            return Self::decode_cr3(data, extension);
        }

        let start = std::time::Instant::now();
        let raw = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| RawDecodeError::Unreadable(e.to_string()))?;

        let cfa = Self::cfa_pattern(&raw);
        let samples = match raw.data {
            RawImageData::Integer(ref data) => Samples::Integer(data),
            RawImageData::Float(ref data) => Samples::Float(data),
        };
        let [top, right, bottom, left] = raw.crops;

        let frame = SensorFrame {
            width: raw.width,
            height: raw.height,
            cpp: raw.cpp,
            samples,
            cfa: cfa.clone(),
            black_levels: raw.blacklevels,
            white_levels: raw.whitelevels,
            white_balance: select_white_balance(raw.wb_coeffs, raw.neutralwb()),
            crop: Crop {
                top,
                right,
                bottom,
                left,
            },
            color_matrix: camera_to_srgb(raw.cam_to_xyz_normalized()),
        };
        let image = upright(develop(&frame)?, exif_orientation(raw.orientation));
        let metadata = Self::metadata(&raw, cfa.as_ref(), image.width(), image.height());

        tracing::debug!(
            extension = %extension,
            make = %raw.clean_make,
            model = %raw.clean_model,
            width = image.width(),
            height = image.height(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "RAW decoded"
        );

        Ok(DecodedImage { image, metadata })
    }
}
