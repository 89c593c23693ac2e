use serde::{Deserialize, Serialize};

/// Camera metadata surfaced by the RAW decoder.
///
/// Values are reported as found in the file; no color correction is derived
/// from them here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetadata {
    pub width: u32,
    pub height: u32,
    /// Number of distinct color filters on the sensor (3 for RGB Bayer).
    pub colors: u32,
    /// `flat` for mosaiced single-sample data, `stack` for multi-sample pixels.
    pub raw_type: String,
    /// CFA color description, e.g. `RGBG`.
    pub color_desc: String,
    pub black_level: u16,
    pub white_level: u16,
    pub camera_whitebalance: Vec<f32>,
    pub daylight_whitebalance: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
