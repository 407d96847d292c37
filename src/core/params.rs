use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::types::{Rgb, Rgba};

/// Tuning parameters for every pipeline stage, suitable for JSON config files.
///
/// Every field falls back to its default, so a params file only needs the
/// values it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParams {
    pub keying: KeyingParams,
    pub gradient: GradientParams,
    pub detection: DetectionParams,
    pub tie: TieParams,
}

impl ProcessingParams {
    /// Load overrides from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: ProcessingParams = serde_json::from_str(&text)?;
        info!("Loaded processing params from {:?}", path);
        Ok(params)
    }
}

/// Inclusive HSV box in OpenCV's 8-bit convention (H in 0..=180).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyingParams {
    /// Hue bands treated as backdrop; red wraps around 0 so two are needed.
    pub bands: Vec<HsvRange>,
    /// Elliptical kernel diameter for closing and opening.
    pub cleanup_kernel: u8,
    pub close_iterations: u32,
    pub open_iterations: u32,
    /// Square kernel side for the final outward dilation. 0 disables it.
    pub border_kernel: u8,
    /// Gaussian kernel size used to feather the subject mask. 0 disables it.
    pub feather_kernel: u8,
}

impl Default for KeyingParams {
    fn default() -> Self {
        Self {
            bands: vec![
                HsvRange::new([0, 60, 40], [10, 255, 255]),
                HsvRange::new([170, 60, 40], [180, 255, 255]),
            ],
            cleanup_kernel: 7,
            close_iterations: 2,
            open_iterations: 1,
            border_kernel: 25,
            feather_kernel: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientParams {
    pub top: Rgb,
    pub bottom: Rgb,
}

impl Default for GradientParams {
    fn default() -> Self {
        Self {
            top: Rgb::new(234, 243, 255),
            bottom: Rgb::new(191, 215, 255),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    /// Pyramid step between scanned window sizes.
    pub scale_factor: f64,
    /// Raw hits a cluster needs (strictly more than this) to count as a face.
    pub min_neighbors: u32,
    pub min_size: u32,
    pub max_size: Option<u32>,
    /// Cluster similarity tolerance for grouping raw hits.
    pub group_eps: f64,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: 80,
            max_size: None,
            group_eps: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieParams {
    /// Assumed chin height as a fraction of image height when no face is found.
    pub fallback_center_y: f64,
    /// Assumed face height as a fraction of image height when no face is found.
    pub fallback_face_height: f64,
    pub knot_height_ratio: f64,
    pub knot_height_min: i32,
    pub knot_width_ratio: f64,
    pub knot_width_min: i32,
    /// Blade length is the larger of these two ratios (image / face height).
    pub length_image_ratio: f64,
    pub length_face_ratio: f64,
    pub bottom_width_ratio: f64,
    pub bottom_width_min: i32,
    /// Minimum gap between the blade tip and the bottom edge.
    pub bottom_margin: i32,
    pub fill: Rgb,
    pub outline: Rgb,
    pub highlight: Rgba,
}

impl Default for TieParams {
    fn default() -> Self {
        Self {
            fallback_center_y: 0.42,
            fallback_face_height: 0.22,
            knot_height_ratio: 0.12,
            knot_height_min: 12,
            knot_width_ratio: 0.16,
            knot_width_min: 16,
            length_image_ratio: 0.20,
            length_face_ratio: 1.2,
            bottom_width_ratio: 1.6,
            bottom_width_min: 26,
            bottom_margin: 6,
            fill: Rgb::new(10, 42, 102),
            outline: Rgb::new(6, 26, 64),
            highlight: Rgba::new(255, 255, 255, 60),
        }
    }
}
