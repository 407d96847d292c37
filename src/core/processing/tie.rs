//! Procedural necktie: geometry anchored under the chin, then flat-filled
//! polygons with a darker outline and a translucent highlight strip.
use image::RgbaImage;
use imageproc::drawing::{Blend, draw_hollow_polygon_mut, draw_polygon_mut};
use imageproc::point::Point;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::params::TieParams;
use crate::types::{FaceRegion, FaceSource};

/// Chin anchor and face height the tie is sized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TieAnchor {
    pub center_x: i32,
    pub chin_y: i32,
    pub face_height: i32,
    pub source: FaceSource,
}

impl TieAnchor {
    /// Use the detected face if any, otherwise assume a centered face in the
    /// upper half of the frame.
    pub fn resolve(width: u32, height: u32, face: Option<&FaceRegion>, params: &TieParams) -> Self {
        match face {
            Some(face) => {
                let (center_x, chin_y) = face.center_bottom();
                Self {
                    center_x,
                    chin_y,
                    face_height: face.height,
                    source: FaceSource::Detected,
                }
            }
            None => Self {
                center_x: (width / 2) as i32,
                chin_y: (height as f64 * params.fallback_center_y) as i32,
                face_height: (height as f64 * params.fallback_face_height) as i32,
                source: FaceSource::Fallback,
            },
        }
    }
}

/// Polygons making up the tie, in image coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TieGeometry {
    pub anchor: TieAnchor,
    pub knot: Vec<(i32, i32)>,
    pub blade: Vec<(i32, i32)>,
    pub highlight: Vec<(i32, i32)>,
    pub knot_width: i32,
    pub knot_height: i32,
    pub blade_length: i32,
    pub blade_bottom_width: i32,
    pub tip_y: i32,
}

fn scaled(value: i32, ratio: f64) -> i32 {
    (value as f64 * ratio) as i32
}

impl TieGeometry {
    pub fn compute(image_height: u32, anchor: TieAnchor, params: &TieParams) -> Self {
        let h = image_height as i32;
        let fh = anchor.face_height;
        let cx = anchor.center_x;

        let knot_height = params.knot_height_min.max(scaled(fh, params.knot_height_ratio));
        let knot_width = params.knot_width_min.max(scaled(fh, params.knot_width_ratio));
        let blade_length =
            scaled(h, params.length_image_ratio).max(scaled(fh, params.length_face_ratio));
        let blade_bottom_width = params
            .bottom_width_min
            .max(scaled(knot_width, params.bottom_width_ratio));

        let knot_top = anchor.chin_y + scaled(fh, 0.02);
        let knot_bottom = knot_top + knot_height;
        let half_knot = knot_width / 2;
        let knot = vec![
            (cx - half_knot, knot_top),
            (cx + half_knot, knot_top),
            (cx + scaled(half_knot, 0.7), knot_bottom),
            (cx - scaled(half_knot, 0.7), knot_bottom),
        ];

        let tip_y = (h - params.bottom_margin).min(knot_bottom + blade_length);
        let half_top = scaled(knot_width, 0.6);
        let half_bottom = blade_bottom_width / 2;
        let shoulder_y = tip_y - scaled(blade_bottom_width, 0.4);
        let blade = vec![
            (cx - half_top, knot_bottom),
            (cx + half_top, knot_bottom),
            (cx + half_bottom, shoulder_y),
            (cx, tip_y),
            (cx - half_bottom, shoulder_y),
        ];

        let highlight = vec![
            (cx - half_top + 1, knot_bottom + 2),
            (cx - half_top + 1, tip_y - scaled(blade_bottom_width, 0.45)),
            (cx - 2, tip_y - 4),
            (cx - 2, knot_bottom + 2),
        ];

        Self {
            anchor,
            knot,
            blade,
            highlight,
            knot_width,
            knot_height,
            blade_length,
            blade_bottom_width,
            tip_y,
        }
    }
}

/// Polygon rasterizers reject a closing vertex equal to the first one and
/// degenerate inputs; collapse those before drawing.
fn to_points(poly: &[(i32, i32)]) -> Option<Vec<Point<i32>>> {
    let mut points: Vec<Point<i32>> = Vec::with_capacity(poly.len());
    for &(x, y) in poly {
        if points.last() != Some(&Point::new(x, y)) {
            points.push(Point::new(x, y));
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    (points.len() >= 3).then_some(points)
}

fn fill_with_outline(
    image: &mut RgbaImage,
    poly: &[(i32, i32)],
    fill: image::Rgba<u8>,
    outline: image::Rgba<u8>,
) {
    let Some(points) = to_points(poly) else {
        debug!("Skipping degenerate polygon {:?}", poly);
        return;
    };
    draw_polygon_mut(image, &points, fill);
    let outline_points: Vec<Point<f32>> = points
        .iter()
        .map(|p| Point::new(p.x as f32, p.y as f32))
        .collect();
    draw_hollow_polygon_mut(image, &outline_points, outline);
}

/// Draw the tie onto a copy of `image`.
pub fn draw_tie(image: &RgbaImage, geometry: &TieGeometry, params: &TieParams) -> RgbaImage {
    let mut canvas = image.clone();
    let fill = params.fill.into();
    let outline = params.outline.into();

    fill_with_outline(&mut canvas, &geometry.knot, fill, outline);
    fill_with_outline(&mut canvas, &geometry.blade, fill, outline);

    let mut blended = Blend(canvas);
    if let Some(points) = to_points(&geometry.highlight) {
        draw_polygon_mut(&mut blended, &points, params.highlight.into());
    }
    let canvas = blended.0;

    info!(
        "Tie drawn from ({}, {}) to tip y={} [{} anchor]",
        geometry.anchor.center_x, geometry.anchor.chin_y, geometry.tip_y, geometry.anchor.source
    );
    canvas
}

/// Resolve the anchor, compute geometry and draw in one step.
pub fn render_tie(
    image: &RgbaImage,
    face: Option<&FaceRegion>,
    params: &TieParams,
) -> (RgbaImage, TieGeometry) {
    let anchor = TieAnchor::resolve(image.width(), image.height(), face, params);
    let geometry = TieGeometry::compute(image.height(), anchor, params);
    (draw_tie(image, &geometry, params), geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const NAVY: [u8; 4] = [10, 42, 102, 255];

    #[test]
    fn fallback_anchor_is_centered_and_scaled_by_height() {
        let params = TieParams::default();
        let anchor = TieAnchor::resolve(400, 500, None, &params);
        assert_eq!(anchor.center_x, 200);
        assert_eq!(anchor.chin_y, 210);
        assert_eq!(anchor.face_height, 110);
        assert_eq!(anchor.source, FaceSource::Fallback);
    }

    #[test]
    fn fallback_geometry_dimensions() {
        let params = TieParams::default();
        let anchor = TieAnchor::resolve(400, 500, None, &params);
        let geo = TieGeometry::compute(500, anchor, &params);
        assert_eq!(geo.knot_height, 13);
        assert_eq!(geo.knot_width, 17);
        assert_eq!(geo.blade_length, 132);
        assert_eq!(geo.blade_bottom_width, 27);
        assert_eq!(geo.knot[0], (192, 212));
        assert_eq!(geo.tip_y, 357);
        assert_eq!(geo.blade[3], (200, 357));
    }

    #[test]
    fn small_faces_hit_minimum_sizes() {
        let params = TieParams::default();
        let face = FaceRegion::new(40, 20, 30, 30);
        let anchor = TieAnchor::resolve(120, 200, Some(&face), &params);
        let geo = TieGeometry::compute(200, anchor, &params);
        assert_eq!(geo.knot_height, 12);
        assert_eq!(geo.knot_width, 16);
        assert_eq!(geo.blade_bottom_width, 26);
        assert_eq!(anchor.source, FaceSource::Detected);
        assert_eq!((anchor.center_x, anchor.chin_y), (55, 48));
    }

    #[test]
    fn tip_never_reaches_past_bottom_margin() {
        let params = TieParams::default();
        let face = FaceRegion::new(50, 100, 100, 100);
        let anchor = TieAnchor::resolve(200, 220, Some(&face), &params);
        let geo = TieGeometry::compute(220, anchor, &params);
        assert_eq!(geo.tip_y, 214);
    }

    #[test]
    fn fallback_tie_is_drawn_below_center() {
        let params = TieParams::default();
        let img = RgbaImage::from_pixel(400, 500, Rgba([230, 240, 255, 255]));
        let (out, geo) = render_tie(&img, None, &params);
        assert_eq!(geo.anchor.source, FaceSource::Fallback);
        assert_eq!(out.get_pixel(200, 218).0, NAVY);
        assert_eq!(out.get_pixel(200, 300).0, NAVY);
        assert_eq!(out.get_pixel(200, 200).0, [230, 240, 255, 255]);
        assert_eq!(out.get_pixel(200, 380).0, [230, 240, 255, 255]);
        assert_eq!(out.get_pixel(20, 300).0, [230, 240, 255, 255]);
    }

    #[test]
    fn highlight_lightens_left_side_of_blade() {
        let params = TieParams::default();
        let img = RgbaImage::from_pixel(400, 500, Rgba([230, 240, 255, 255]));
        let (out, _) = render_tie(&img, None, &params);
        let lit = out.get_pixel(195, 260).0;
        assert!(lit[0] > NAVY[0] && lit[2] > NAVY[2]);
        assert_eq!(lit[3], 255);
    }

    #[test]
    fn degenerate_polygon_is_skipped() {
        assert!(to_points(&[(1, 1), (1, 1), (1, 1)]).is_none());
        assert_eq!(to_points(&[(0, 0), (4, 0), (2, 3), (0, 0)]).unwrap().len(), 3);
    }
}
