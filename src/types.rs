//! Shared types used across headshot.
//! Includes the color constants wrappers (`Rgb`, `Rgba`), the detected
//! `FaceRegion`, where the tie anchor came from (`FaceSource`) and the
//! requested output size (`TargetSize`).
use serde::{Deserialize, Serialize};

/// Opaque 8-bit color.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb([r, g, b])
    }

    pub fn with_alpha(self, alpha: u8) -> Rgba {
        let [r, g, b] = self.0;
        Rgba([r, g, b, alpha])
    }
}

/// 8-bit color with straight (non-premultiplied) alpha.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba([r, g, b, a])
    }
}

impl From<Rgba> for image::Rgba<u8> {
    fn from(c: Rgba) -> Self {
        image::Rgba(c.0)
    }
}

impl From<Rgb> for image::Rgba<u8> {
    fn from(c: Rgb) -> Self {
        image::Rgba(c.with_alpha(255).0)
    }
}

/// Axis-aligned face bounding box in image pixels.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceRegion {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Chin point: horizontal center, 95% down the box.
    pub fn center_bottom(&self) -> (i32, i32) {
        (
            self.x + self.width / 2,
            (self.y as f64 + self.height as f64 * 0.95) as i32,
        )
    }
}

impl std::fmt::Display for FaceRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.x, self.y
        )
    }
}

/// Where the tie anchor was taken from.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceSource {
    Detected,
    Fallback,
}

impl std::fmt::Display for FaceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaceSource::Detected => write!(f, "Detected"),
            FaceSource::Fallback => write!(f, "Fallback"),
        }
    }
}

/// Requested output size; missing sides follow the source aspect ratio.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TargetSize {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    pub fn is_original(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}
