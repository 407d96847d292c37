use image::{Rgba, RgbaImage};
use tracing::info;

use crate::core::processing::resize::resize_rgba_image;
use crate::error::Result;

/// Porter-Duff "over" for a single straight-alpha pixel pair.
pub fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match src.0[3] {
        255 => return src,
        0 => return dst,
        _ => {}
    }

    let sa = src.0[3] as f32 / 255.0;
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let c = (src.0[i] as f32 * sa + dst.0[i] as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Layer `subject` over `background`; the subject is Lanczos-resized to the
/// background size first when they differ.
pub fn compose_over(subject: &RgbaImage, background: &RgbaImage) -> Result<RgbaImage> {
    let (width, height) = background.dimensions();
    let subject = if subject.dimensions() != (width, height) {
        info!(
            "Subject {}x{} resized to background {}x{}",
            subject.width(),
            subject.height(),
            width,
            height
        );
        resize_rgba_image(subject, width, height)?
    } else {
        subject.clone()
    };

    let mut composed = background.clone();
    for (out, src) in composed.pixels_mut().zip(subject.pixels()) {
        *out = blend_over(*src, *out);
    }
    Ok(composed)
}
