//! Face localization: a pluggable [`FaceDetector`] trait, the built-in Haar
//! cascade backend, and the stage helper that picks the primary face.
//!
//! The cascade file is only located and parsed when the detection stage
//! actually runs.
pub mod cascade;
pub mod integral;
pub mod multiscale;

pub use cascade::{CascadeError, HaarCascade};
pub use multiscale::{HaarCascadeDetector, group_rectangles};

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma, RgbaImage};
use tracing::{info, warn};

use crate::core::params::DetectionParams;
use crate::error::Result;
use crate::types::FaceRegion;

/// File name of OpenCV's stock frontal face cascade.
pub const DEFAULT_CASCADE_FILE: &str = "haarcascade_frontalface_default.xml";

/// Directories OpenCV packages install their Haar cascades into.
const CASCADE_SEARCH_DIRS: &[&str] = &[
    "/usr/share/opencv4/haarcascades",
    "/usr/share/opencv/haarcascades",
    "/usr/local/share/opencv4/haarcascades",
    "/usr/local/share/opencv/haarcascades",
    "/opt/homebrew/share/opencv4/haarcascades",
    "/opt/local/share/opencv4/haarcascades",
];

/// Pluggable face detection backend.
pub trait FaceDetector {
    /// Detect faces in a grayscale image; boxes are in its pixel coordinates.
    fn detect(&self, gray: &GrayImage) -> Result<Vec<FaceRegion>>;
}

/// Where to get the Haar cascade from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CascadeSource {
    /// Explicit file; failing to load it is an error.
    Path(PathBuf),
    /// Look in the standard OpenCV install locations; absence means no detection.
    #[default]
    Search,
    /// Skip detection altogether.
    Disabled,
}

impl CascadeSource {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        path.map(CascadeSource::Path).unwrap_or_default()
    }

    /// Parse the cascade and wrap it in a detector, or `None` when the
    /// source yields no cascade.
    pub fn load(&self, params: DetectionParams) -> Result<Option<HaarCascadeDetector>> {
        let path = match self {
            CascadeSource::Path(p) => p.clone(),
            CascadeSource::Search => match find_default_cascade() {
                Some(p) => p,
                None => {
                    warn!(
                        "No {} found in standard OpenCV locations; face detection skipped",
                        DEFAULT_CASCADE_FILE
                    );
                    return Ok(None);
                }
            },
            CascadeSource::Disabled => return Ok(None),
        };
        let cascade = HaarCascade::from_file(&path)?;
        Ok(Some(HaarCascadeDetector::new(cascade, params)?))
    }
}

pub fn find_default_cascade() -> Option<PathBuf> {
    find_cascade_in(CASCADE_SEARCH_DIRS.iter().map(Path::new))
}

fn find_cascade_in<'a>(dirs: impl IntoIterator<Item = &'a Path>) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(DEFAULT_CASCADE_FILE))
        .find(|candidate| candidate.is_file())
}

/// BT.601 luma, the weighting Haar cascades are trained on.
pub fn to_grayscale(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Largest detection by area; ties keep the first one found.
pub fn select_primary_face(faces: &[FaceRegion]) -> Option<FaceRegion> {
    faces
        .iter()
        .copied()
        .reduce(|best, f| if f.area() > best.area() { f } else { best })
}

/// Detect the most prominent face, or `None` if there is no detector or no hit.
pub fn detect_primary_face(
    image: &RgbaImage,
    detector: Option<&dyn FaceDetector>,
) -> Result<Option<FaceRegion>> {
    let Some(detector) = detector else {
        return Ok(None);
    };
    let gray = to_grayscale(image);
    let faces = detector.detect(&gray)?;
    let primary = select_primary_face(&faces);
    match &primary {
        Some(face) => info!("Detected {} face(s); primary {}", faces.len(), face),
        None => info!("No face detected; using fallback tie placement"),
    }
    Ok(primary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    struct FixedDetector(Vec<FaceRegion>);

    impl FaceDetector for FixedDetector {
        fn detect(&self, _gray: &GrayImage) -> Result<Vec<FaceRegion>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn largest_face_wins() {
        let faces = [
            FaceRegion::new(0, 0, 90, 90),
            FaceRegion::new(10, 10, 120, 100),
            FaceRegion::new(5, 5, 100, 100),
        ];
        assert_eq!(select_primary_face(&faces), Some(faces[1]));
        assert_eq!(select_primary_face(&[]), None);
    }

    #[test]
    fn no_detector_means_no_face() {
        let img = RgbaImage::new(10, 10);
        assert_eq!(detect_primary_face(&img, None).unwrap(), None);
    }

    #[test]
    fn detector_results_are_reduced_to_primary() {
        let img = RgbaImage::new(10, 10);
        let detector = FixedDetector(vec![
            FaceRegion::new(0, 0, 5, 5),
            FaceRegion::new(1, 1, 8, 8),
        ]);
        let face = detect_primary_face(&img, Some(&detector)).unwrap();
        assert_eq!(face, Some(FaceRegion::new(1, 1, 8, 8)));
    }

    #[test]
    fn grayscale_uses_bt601_weights() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        assert_eq!(to_grayscale(&img).get_pixel(0, 0).0, [76]);
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 255, 0, 255]));
        assert_eq!(to_grayscale(&img).get_pixel(0, 0).0, [150]);
    }

    #[test]
    fn search_finds_cascade_in_given_dirs() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_cascade_in([dir.path()]), None);
        let file = dir.path().join(DEFAULT_CASCADE_FILE);
        std::fs::write(&file, "<opencv_storage/>").unwrap();
        assert_eq!(find_cascade_in([Path::new("/nonexistent"), dir.path()]), Some(file));
    }

    #[test]
    fn explicit_missing_cascade_is_an_error() {
        let source = CascadeSource::from_option(Some(PathBuf::from("/nonexistent/c.xml")));
        assert!(source.load(DetectionParams::default()).is_err());
    }

    #[test]
    fn disabled_source_loads_nothing() {
        let loaded = CascadeSource::Disabled.load(DetectionParams::default()).unwrap();
        assert!(loaded.is_none());
    }
}
