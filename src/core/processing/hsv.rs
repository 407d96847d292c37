use image::{GrayImage, Luma, RgbImage};

use crate::core::params::HsvRange;

/// Convert one RGB pixel to 8-bit HSV (H in 0..180, S and V in 0..=255).
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        (255.0 * diff as f32 / v as f32 + 0.5) as i32
    };

    let h = if diff == 0 {
        0
    } else {
        let sector = if v == r {
            (g - b) as f32
        } else if v == g {
            (b - r + 2 * diff) as f32
        } else {
            (r - g + 4 * diff) as f32
        };
        let h = (sector * 30.0 / diff as f32 + 0.5).floor() as i32;
        if h < 0 { h + 180 } else { h }
    };

    [h as u8, s as u8, v as u8]
}

/// Binary mask (255 inside) of pixels falling in any of `bands`.
pub fn in_any_range(image: &RgbImage, bands: &[HsvRange]) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let hsv = rgb_to_hsv(image.get_pixel(x, y).0);
        if bands.iter().any(|band| band.contains(hsv)) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn primaries_land_on_opencv_hues() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
    }

    #[test]
    fn grays_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn magenta_leaning_red_wraps_near_180() {
        let [h, _, _] = rgb_to_hsv([200, 20, 60]);
        assert!(h >= 170, "hue {h}");
    }

    #[test]
    fn band_union_marks_reds_only() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([220, 30, 30]));
        img.put_pixel(1, 0, Rgb([200, 20, 60]));
        img.put_pixel(2, 0, Rgb([230, 200, 180]));
        let bands = crate::core::params::KeyingParams::default().bands;
        let mask = in_any_range(&img, &bands);
        assert_eq!(mask.get_pixel(0, 0).0, [255]);
        assert_eq!(mask.get_pixel(1, 0).0, [255]);
        assert_eq!(mask.get_pixel(2, 0).0, [0]);
    }
}
