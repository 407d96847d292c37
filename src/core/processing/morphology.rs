//! Binary mask cleanup on top of `imageproc`'s grayscale morphology.
//!
//! Out-of-bounds samples are ignored by both dilation and erosion, so the
//! image border never pulls a mask inward or outward on its own.
use image::{GrayImage, Luma};
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};

/// Filled ellipse inscribed in a `size`×`size` box, rasterized row by row
/// the same way OpenCV builds `MORPH_ELLIPSE` elements.
pub fn ellipse_mask(size: u8) -> Mask {
    let size = size.max(1);
    let radius = (size / 2) as i32;
    let side = size as i32;
    let inv_r2 = if radius > 0 {
        1.0 / (radius * radius) as f64
    } else {
        0.0
    };

    let mut element = GrayImage::new(size as u32, size as u32);
    for row in 0..side {
        let dy = row - radius;
        if dy.abs() > radius {
            continue;
        }
        let dx = if radius > 0 {
            (radius as f64 * (((radius * radius - dy * dy) as f64) * inv_r2).sqrt()).round() as i32
        } else {
            0
        };
        let start = (radius - dx).max(0);
        let end = (radius + dx + 1).min(side);
        for col in start..end {
            element.put_pixel(col as u32, row as u32, Luma([255]));
        }
    }
    Mask::from_image(&element, radius as u8, radius as u8)
}

/// Square element of side `size` (rounded up to odd).
pub fn square_mask(size: u8) -> Mask {
    Mask::square(size / 2)
}

pub fn dilate(mask: &GrayImage, element: &Mask, iterations: u32) -> GrayImage {
    (0..iterations).fold(mask.clone(), |acc, _| grayscale_dilate(&acc, element))
}

pub fn erode(mask: &GrayImage, element: &Mask, iterations: u32) -> GrayImage {
    (0..iterations).fold(mask.clone(), |acc, _| grayscale_erode(&acc, element))
}

/// Dilate `iterations` times, then erode as many times: fills small holes.
pub fn close(mask: &GrayImage, element: &Mask, iterations: u32) -> GrayImage {
    erode(&dilate(mask, element, iterations), element, iterations)
}

/// Erode `iterations` times, then dilate as many times: removes specks.
pub fn open(mask: &GrayImage, element: &Mask, iterations: u32) -> GrayImage {
    dilate(&erode(mask, element, iterations), element, iterations)
}

pub fn invert(mask: &GrayImage) -> GrayImage {
    let mut out = mask.clone();
    image::imageops::invert(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(width: u32, height: u32, on: &[(u32, u32)]) -> GrayImage {
        let mut m = GrayImage::new(width, height);
        for &(x, y) in on {
            m.put_pixel(x, y, Luma([255]));
        }
        m
    }

    fn count_on(m: &GrayImage) -> usize {
        m.pixels().filter(|p| p.0[0] == 255).count()
    }

    #[test]
    fn ellipse_seven_matches_opencv_footprint() {
        // Rows of the 7x7 element: 1, 5, 7, 7, 7, 5, 1 pixels.
        let single = mask_with(9, 9, &[(4, 4)]);
        let grown = grayscale_dilate(&single, &ellipse_mask(7));
        assert_eq!(count_on(&grown), 1 + 5 + 7 + 7 + 7 + 5 + 1);
        assert_eq!(grown.get_pixel(4, 1).0, [255]);
        assert_eq!(grown.get_pixel(3, 1).0, [0]);
        assert_eq!(grown.get_pixel(1, 4).0, [255]);
        assert_eq!(grown.get_pixel(2, 2).0, [255]);
        assert_eq!(grown.get_pixel(1, 2).0, [0]);
    }

    #[test]
    fn square_dilation_grows_a_point_into_a_block() {
        let single = mask_with(31, 31, &[(15, 15)]);
        let grown = dilate(&single, &square_mask(25), 1);
        assert_eq!(count_on(&grown), 25 * 25);
    }

    #[test]
    fn open_removes_isolated_speck() {
        let mut m = GrayImage::from_pixel(20, 20, Luma([0]));
        m.put_pixel(10, 10, Luma([255]));
        let cleaned = open(&m, &ellipse_mask(7), 1);
        assert_eq!(count_on(&cleaned), 0);
    }

    #[test]
    fn close_fills_pinhole() {
        let mut m = GrayImage::from_pixel(20, 20, Luma([255]));
        m.put_pixel(10, 10, Luma([0]));
        let filled = close(&m, &ellipse_mask(7), 2);
        assert_eq!(count_on(&filled), 400);
    }

    #[test]
    fn invert_flips_values() {
        let m = mask_with(2, 1, &[(0, 0)]);
        let inv = invert(&m);
        assert_eq!(inv.get_pixel(0, 0).0, [0]);
        assert_eq!(inv.get_pixel(1, 0).0, [255]);
    }
}
