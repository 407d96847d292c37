use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::{GrayImage, RgbImage, RgbaImage};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::TargetSize;

/// Resolve the requested output size against the source dimensions.
///
/// A single given side drives the other through the source aspect ratio
/// (truncated); both given are used as-is; neither keeps the original.
pub fn calculate_target_dimensions(
    original_width: u32,
    original_height: u32,
    target: TargetSize,
) -> Result<(u32, u32)> {
    let (width, height) = match (target.width, target.height) {
        (None, None) => (original_width, original_height),
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => {
            let h = (original_height as f64 * (w as f64 / original_width as f64)) as u32;
            (w, h)
        }
        (None, Some(h)) => {
            let w = (original_width as f64 * (h as f64 / original_height as f64)) as u32;
            (w, h)
        }
    };

    if width == 0 || height == 0 {
        return Err(Error::ZeroSize { width, height });
    }
    if let (Some(w), Some(h)) = (target.width, target.height) {
        let requested = w as f64 / h as f64;
        let source = original_width as f64 / original_height as f64;
        if (requested - source).abs() > 0.01 {
            warn!(
                "Requested {}x{} changes the aspect ratio of the {}x{} source",
                w, h, original_width, original_height
            );
        }
    }
    Ok((width, height))
}

fn resize_raw(
    data: Vec<u8>,
    original: (u32, u32),
    target: (u32, u32),
    pixel_type: PixelType,
    alg: ResizeAlg,
) -> Result<Vec<u8>> {
    let resize_options = ResizeOptions::new().resize_alg(alg);
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(original.0, original.1, data, pixel_type)
        .map_err(|e| Error::Resize(e.to_string()))?;
    let mut dst_image = Image::new(target.0, target.1, pixel_type);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(|e| Error::Resize(e.to_string()))?;

    Ok(dst_image.into_vec())
}

/// Lanczos3 resize of an RGB photo.
pub fn resize_rgb_image(image: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }
    info!(
        "Resizing image {}x{} -> {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );
    let data = resize_raw(
        image.as_raw().clone(),
        image.dimensions(),
        (width, height),
        PixelType::U8x3,
        ResizeAlg::Convolution(FilterType::Lanczos3),
    )?;
    RgbImage::from_raw(width, height, data)
        .ok_or_else(|| Error::Resize("RGB buffer size mismatch".to_string()))
}

/// Lanczos3 resize of an RGBA cutout; color is weighted by alpha while
/// filtering so transparent pixels do not bleed into the edges.
pub fn resize_rgba_image(image: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }
    info!(
        "Resizing RGBA layer {}x{} -> {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );
    let data = resize_raw(
        image.as_raw().clone(),
        image.dimensions(),
        (width, height),
        PixelType::U8x4,
        ResizeAlg::Convolution(FilterType::Lanczos3),
    )?;
    RgbaImage::from_raw(width, height, data)
        .ok_or_else(|| Error::Resize("RGBA buffer size mismatch".to_string()))
}

/// Plain bilinear interpolation (no antialiasing), used for detector pyramids.
pub fn resize_gray_bilinear(image: &GrayImage, width: u32, height: u32) -> Result<GrayImage> {
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }
    let data = resize_raw(
        image.as_raw().clone(),
        image.dimensions(),
        (width, height),
        PixelType::U8,
        ResizeAlg::Interpolation(FilterType::Bilinear),
    )?;
    GrayImage::from_raw(width, height, data)
        .ok_or_else(|| Error::Resize("gray buffer size mismatch".to_string()))
}
