use image::{Rgba, RgbaImage};

use crate::types::Rgb;

/// Opaque vertical two-stop gradient, one interpolated color per row.
pub fn vertical_gradient(width: u32, height: u32, top: Rgb, bottom: Rgb) -> RgbaImage {
    let denom = height.saturating_sub(1).max(1) as f32;
    let rows: Vec<Rgba<u8>> = (0..height)
        .map(|row| {
            let t = row as f32 / denom;
            let mix = |a: u8, b: u8| (a as f32 + t * (b as f32 - a as f32)) as u8;
            Rgba([
                mix(top.0[0], bottom.0[0]),
                mix(top.0[1], bottom.0[1]),
                mix(top.0[2], bottom.0[2]),
                255,
            ])
        })
        .collect();

    RgbaImage::from_fn(width, height, |_, y| rows[y as usize])
}
