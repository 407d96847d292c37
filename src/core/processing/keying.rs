//! Red backdrop keying: HSV band masks, morphological cleanup, feathered
//! alpha. Tuned for a fairly uniform red backdrop; other backdrops give a
//! degraded cutout rather than an error.
use image::{GrayImage, Rgba, RgbImage, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, info};

use crate::core::params::KeyingParams;
use crate::core::processing::hsv::in_any_range;
use crate::core::processing::morphology::{close, dilate, ellipse_mask, invert, open, square_mask};

/// Backdrop likelihood mask (255 = backdrop) after cleanup.
pub fn background_mask(image: &RgbImage, params: &KeyingParams) -> GrayImage {
    let raw = in_any_range(image, &params.bands);
    debug!(
        "Raw backdrop mask covers {:.1}% of pixels",
        coverage(&raw) * 100.0
    );

    let element = ellipse_mask(params.cleanup_kernel);
    let closed = close(&raw, &element, params.close_iterations);
    let opened = open(&closed, &element, params.open_iterations);

    if params.border_kernel > 0 {
        dilate(&opened, &square_mask(params.border_kernel), 1)
    } else {
        opened
    }
}

/// Gaussian sigma OpenCV picks for a `ksize` kernel when sigma is left at 0.
pub fn sigma_for_kernel(ksize: u8) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Subject mask (255 = keep) with feathered edges.
pub fn subject_mask(image: &RgbImage, params: &KeyingParams) -> GrayImage {
    let subject = invert(&background_mask(image, params));
    if params.feather_kernel > 1 {
        gaussian_blur_f32(&subject, sigma_for_kernel(params.feather_kernel))
    } else {
        subject
    }
}

/// Cut the subject out of its backdrop: RGB untouched, alpha from the mask.
pub fn remove_background(image: &RgbImage, params: &KeyingParams) -> RgbaImage {
    let alpha = subject_mask(image, params);
    info!(
        "Keyed backdrop: subject covers {:.1}% of {}x{}",
        coverage(&alpha) * 100.0,
        image.width(),
        image.height()
    );

    RgbaImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Rgba([r, g, b, alpha.get_pixel(x, y).0[0]])
    })
}

/// Mean mask intensity as a fraction of full scale.
fn coverage(mask: &GrayImage) -> f64 {
    let total = mask.width() as f64 * mask.height() as f64;
    if total == 0.0 {
        return 0.0;
    }
    mask.pixels().map(|p| p.0[0] as f64).sum::<f64>() / (255.0 * total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn red_with_gray_block(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let inside = x >= width / 4 && x < 3 * width / 4 && y >= height / 4;
            if inside {
                Rgb([150, 150, 150])
            } else {
                Rgb([200, 25, 30])
            }
        })
    }

    #[test]
    fn solid_red_is_fully_transparent() {
        let img = RgbImage::from_pixel(64, 48, Rgb([255, 0, 0]));
        let cut = remove_background(&img, &KeyingParams::default());
        assert!(cut.pixels().all(|p| p.0[3] <= 2));
        assert_eq!(cut.get_pixel(10, 10).0[..3], [255, 0, 0]);
    }

    #[test]
    fn non_red_image_is_kept_opaque() {
        let img = RgbImage::from_pixel(64, 48, Rgb([40, 90, 200]));
        let cut = remove_background(&img, &KeyingParams::default());
        assert!(cut.pixels().all(|p| p.0[3] >= 254));
    }

    #[test]
    fn subject_block_survives_with_pulled_in_edges() {
        let img = red_with_gray_block(160, 160);
        let alpha = subject_mask(&img, &KeyingParams::default());
        // Backdrop corners and the block center.
        assert_eq!(alpha.get_pixel(2, 2).0, [0]);
        assert_eq!(alpha.get_pixel(157, 10).0, [0]);
        assert!(alpha.get_pixel(80, 120).0[0] >= 254);
        // The border dilation eats about 12px into the subject.
        assert!(alpha.get_pixel(42, 120).0[0] < 128);
    }

    #[test]
    fn opencv_default_sigma_for_nine() {
        assert!((sigma_for_kernel(9) - 1.7).abs() < 1e-6);
    }

    #[test]
    fn disabled_stages_keep_hard_edges() {
        let params = KeyingParams {
            border_kernel: 0,
            feather_kernel: 0,
            ..KeyingParams::default()
        };
        let img = red_with_gray_block(80, 80);
        let alpha = subject_mask(&img, &params);
        assert!(alpha.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert_eq!(alpha.get_pixel(20, 40).0, [255]);
        assert_eq!(alpha.get_pixel(19, 40).0, [0]);
    }
}
