//! Sensor data to 8-bit sRGB.
//!
//! Steps, in order: crop to the active area, subtract black level and scale
//! by the white level, apply the camera white balance (normalized to green),
//! fill missing color samples by bilinear interpolation over the CFA, convert
//! camera RGB to linear sRGB when a color matrix is known, then encode with
//! the sRGB transfer curve.

use image::RgbImage;

use super::RawDecodeError;

const LUT_SIZE: usize = 1 << 16;

/// XYZ (D65) to linear sRGB.
const XYZ_TO_SRGB: [[f32; 3]; 3] = [
    [3.240_454_2, -1.537_138_5, -0.498_531_4],
    [-0.969_266, 1.876_010_8, 0.041_556],
    [0.055_643_4, -0.204_025_9, 1.057_225_2],
];

/// Sensor samples as stored in the file.
#[derive(Debug, Clone, Copy)]
pub enum Samples<'a> {
    Integer(&'a [u16]),
    Float(&'a [f32]),
}

impl Samples<'_> {
    fn len(&self) -> usize {
        match self {
            Samples::Integer(data) => data.len(),
            Samples::Float(data) => data.len(),
        }
    }

    #[inline]
    fn get(&self, index: usize) -> f32 {
        match self {
            Samples::Integer(data) => data[index] as f32,
            Samples::Float(data) => data[index],
        }
    }
}

/// Repeating color filter layout. Colors are 0 = red, 1 = green, 2 = blue,
/// 3 = a fourth filter (second green or emerald), rendered as green.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfaPattern {
    pub width: usize,
    pub height: usize,
    /// Row-major, `width * height` entries.
    pub colors: Vec<u8>,
}

impl CfaPattern {
    /// Parse a pattern name such as `RGGB` (square patterns only).
    pub fn from_name(name: &str) -> Option<Self> {
        let side = (name.len() as f64).sqrt() as usize;
        if side == 0 || side * side != name.len() {
            return None;
        }
        let colors = name
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                'R' => Some(0),
                'G' => Some(1),
                'B' => Some(2),
                'E' => Some(3),
                _ => None,
            })
            .collect::<Option<Vec<u8>>>()?;
        Some(Self {
            width: side,
            height: side,
            colors,
        })
    }

    #[inline]
    pub fn color_at(&self, row: usize, col: usize) -> usize {
        self.colors[(row % self.height) * self.width + (col % self.width)] as usize
    }

    /// Number of distinct filter colors in the pattern.
    pub fn color_count(&self) -> u32 {
        let mut seen = [false; 4];
        for &color in &self.colors {
            seen[color as usize & 3] = true;
        }
        seen.iter().filter(|&&s| s).count() as u32
    }

    /// Pattern name over one period, e.g. `RGGB`.
    pub fn name(&self) -> String {
        self.colors
            .iter()
            .map(|&c| match c {
                0 => 'R',
                1 => 'G',
                2 => 'B',
                _ => 'E',
            })
            .collect()
    }
}

/// Active-area crop in sensor pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crop {
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
    pub left: usize,
}

/// Everything needed to render a sensor dump.
#[derive(Debug, Clone)]
pub struct SensorFrame<'a> {
    pub width: usize,
    pub height: usize,
    /// Components per pixel: 1 for mosaiced data, 3 for already-RGB data.
    pub cpp: usize,
    pub samples: Samples<'a>,
    /// Required when `cpp == 1`.
    pub cfa: Option<CfaPattern>,
    /// Per filter color, indexed like `CfaPattern::colors`.
    pub black_levels: [u16; 4],
    pub white_levels: [u16; 4],
    pub white_balance: [f32; 4],
    pub crop: Crop,
    /// Camera RGB to linear sRGB, applied after white balance. Rows sum to 1
    /// so white-balanced neutrals stay neutral.
    pub color_matrix: Option<[[f32; 3]; 3]>,
}

/// Pick the white balance to apply: the camera's as-shot multipliers when
/// usable, otherwise the daylight ones, otherwise none. Normalized so that
/// green is 1.
pub fn select_white_balance(camera: [f32; 4], daylight: [f32; 4]) -> [f32; 4] {
    let usable = |wb: &[f32; 4]| wb[..3].iter().all(|v| v.is_finite() && *v > 0.0);

    let mut wb = if usable(&camera) {
        camera
    } else if usable(&daylight) {
        daylight
    } else {
        [1.0; 4]
    };

    if !(wb[3].is_finite() && wb[3] > 0.0) {
        wb[3] = wb[1];
    }

    let green = wb[1];
    wb.map(|v| v / green)
}

/// Build the camera to sRGB matrix from a camera to XYZ matrix whose columns
/// are indexed like `CfaPattern::colors`. The fourth filter color is folded
/// into green, matching how it is rendered. Returns `None` for cameras
/// without calibration data.
pub fn camera_to_srgb(cam_to_xyz: [[f32; 4]; 3]) -> Option<[[f32; 3]; 3]> {
    let mut matrix = [[0f32; 3]; 3];
    for (out, srgb_row) in matrix.iter_mut().zip(XYZ_TO_SRGB.iter()) {
        for (c, value) in out.iter_mut().enumerate() {
            *value = (0..3).map(|k| srgb_row[k] * cam_to_xyz[k][c]).sum();
        }
        out[1] += (0..3).map(|k| srgb_row[k] * cam_to_xyz[k][3]).sum::<f32>();

        let sum: f32 = out.iter().sum();
        if !sum.is_finite() || sum.abs() < 1e-6 {
            return None;
        }
        for value in out.iter_mut() {
            *value /= sum;
        }
    }
    matrix
        .iter()
        .flatten()
        .all(|v| v.is_finite())
        .then_some(matrix)
}

#[inline]
fn convert(matrix: Option<&[[f32; 3]; 3]>, rgb: [f32; 3]) -> [f32; 3] {
    match matrix {
        Some(m) => std::array::from_fn(|i| {
            m[i][0] * rgb[0] + m[i][1] * rgb[1] + m[i][2] * rgb[2]
        }),
        None => rgb,
    }
}

fn srgb_lut() -> Vec<u8> {
    (0..LUT_SIZE)
        .map(|i| {
            let linear = i as f32 / (LUT_SIZE - 1) as f32;
            let encoded = if linear <= 0.003_130_8 {
                linear * 12.92
            } else {
                1.055 * linear.powf(1.0 / 2.4) - 0.055
            };
            (encoded * 255.0).round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

#[inline]
fn to_u8(lut: &[u8], value: f32) -> u8 {
    let index = (value.clamp(0.0, 1.0) * (LUT_SIZE - 1) as f32) as usize;
    lut[index]
}

/// Render a sensor frame to an 8-bit sRGB image.
pub fn develop(frame: &SensorFrame<'_>) -> Result<RgbImage, RawDecodeError> {
    let SensorFrame {
        width,
        height,
        cpp,
        ..
    } = *frame;

    if width == 0 || height == 0 {
        return Err(RawDecodeError::UnsupportedLayout(
            "sensor has no pixels".to_string(),
        ));
    }
    if cpp != 1 && cpp != 3 {
        return Err(RawDecodeError::UnsupportedLayout(format!(
            "{} components per pixel",
            cpp
        )));
    }
    if frame.samples.len() < width * height * cpp {
        return Err(RawDecodeError::Unreadable(format!(
            "expected {} samples, found {}",
            width * height * cpp,
            frame.samples.len()
        )));
    }

    let crop = if frame.crop.top + frame.crop.bottom < height
        && frame.crop.left + frame.crop.right < width
    {
        frame.crop
    } else {
        Crop::default()
    };
    let out_width = width - crop.left - crop.right;
    let out_height = height - crop.top - crop.bottom;

    let scale: [(f32, f32); 4] = std::array::from_fn(|c| {
        let black = frame.black_levels[c] as f32;
        let range = (frame.white_levels[c] as f32 - black).max(1.0);
        (black, frame.white_balance[c] / range)
    });
    let normalize = |value: f32, color: usize| -> f32 {
        let (black, factor) = scale[color & 3];
        ((value - black) * factor).max(0.0)
    };

    let lut = srgb_lut();
    let matrix = frame.color_matrix.as_ref();
    let mut image = RgbImage::new(out_width as u32, out_height as u32);

    if cpp == 3 {
        for row in 0..out_height {
            for col in 0..out_width {
                let base = ((row + crop.top) * width + col + crop.left) * 3;
                let rgb = [0, 1, 2].map(|c| normalize(frame.samples.get(base + c), c));
                let pixel = convert(matrix, rgb).map(|v| to_u8(&lut, v));
                image.put_pixel(col as u32, row as u32, image::Rgb(pixel));
            }
        }
        return Ok(image);
    }

    let cfa = frame
        .cfa
        .as_ref()
        .filter(|cfa| {
            cfa.width > 0 && cfa.height > 0 && cfa.colors.len() == cfa.width * cfa.height
        })
        .ok_or_else(|| {
            RawDecodeError::UnsupportedLayout("mosaiced data without a CFA pattern".to_string())
        })?;

    // Normalized, white-balanced plane of the active area.
    let mut plane = vec![0f32; out_width * out_height];
    let mut channel = vec![0u8; out_width * out_height];
    for row in 0..out_height {
        let sensor_row = row + crop.top;
        for col in 0..out_width {
            let sensor_col = col + crop.left;
            let color = cfa.color_at(sensor_row, sensor_col);
            let value = frame.samples.get(sensor_row * width + sensor_col);
            plane[row * out_width + col] = normalize(value, color);
            channel[row * out_width + col] = if color == 3 { 1 } else { color as u8 };
        }
    }

    for row in 0..out_height {
        for col in 0..out_width {
            let own = channel[row * out_width + col] as usize;
            let mut rgb = [0f32; 3];
            for (c, value) in rgb.iter_mut().enumerate() {
                *value = if c == own {
                    plane[row * out_width + col]
                } else {
                    interpolate(&plane, &channel, out_width, out_height, row, col, c as u8)
                };
            }
            let pixel = convert(matrix, rgb).map(|v| to_u8(&lut, v));
            image.put_pixel(col as u32, row as u32, image::Rgb(pixel));
        }
    }

    Ok(image)
}

/// Mean of the nearest samples of channel `c` around `(row, col)`: the 3x3
/// neighbourhood first, widening to 5x5 for sparse patterns.
fn interpolate(
    plane: &[f32],
    channel: &[u8],
    width: usize,
    height: usize,
    row: usize,
    col: usize,
    c: u8,
) -> f32 {
    for radius in 1..=2usize {
        let (mut sum, mut count) = (0f32, 0u32);
        let rows = row.saturating_sub(radius)..=(row + radius).min(height - 1);
        for r in rows {
            let cols = col.saturating_sub(radius)..=(col + radius).min(width - 1);
            for k in cols {
                let index = r * width + k;
                if channel[index] == c {
                    sum += plane[index];
                    count += 1;
                }
            }
        }
        if count > 0 {
            return sum / count as f32;
        }
    }
    0.0
}
