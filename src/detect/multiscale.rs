use image::GrayImage;
use tracing::debug;

use crate::core::params::DetectionParams;
use crate::core::processing::resize::resize_gray_bilinear;
use crate::detect::FaceDetector;
use crate::detect::cascade::HaarCascade;
use crate::detect::integral::IntegralImage;
use crate::error::{Error, Result};
use crate::types::FaceRegion;

/// Outcome of running the cascade on one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Accepted,
    /// Index of the stage that rejected the window.
    Rejected(usize),
}

/// Sliding-window Haar cascade detector over an image pyramid.
pub struct HaarCascadeDetector {
    cascade: HaarCascade,
    params: DetectionParams,
}

impl HaarCascadeDetector {
    pub fn new(cascade: HaarCascade, params: DetectionParams) -> Result<Self> {
        if !(params.scale_factor > 1.0) {
            return Err(Error::InvalidArgument {
                arg: "scale_factor",
                value: params.scale_factor.to_string(),
            });
        }
        Ok(Self { cascade, params })
    }

    pub fn cascade(&self) -> &HaarCascade {
        &self.cascade
    }

    /// Run the stages on the window whose top-left corner is `(x, y)`,
    /// stopping at the first one that rejects it.
    fn classify_window(&self, ii: &IntegralImage, x: usize, y: usize) -> Verdict {
        let ww = self.cascade.window_width as usize;
        let wh = self.cascade.window_height as usize;

        // Normalize by the standard deviation of the window minus a 1px border.
        let inner_area = ((ww - 2) * (wh - 2)) as f64;
        let s = ii.rect_sum(x + 1, y + 1, ww - 2, wh - 2) as f64;
        let sq = ii.rect_sq_sum(x + 1, y + 1, ww - 2, wh - 2) as f64;
        let nf = inner_area * sq - s * s;
        let nf = if nf > 0.0 { nf.sqrt() } else { 1.0 };

        let features = &self.cascade.features;
        let feature_value = |fi: usize| -> f32 {
            let raw: f64 = features[fi]
                .rects
                .iter()
                .map(|r| {
                    r.weight as f64
                        * ii.rect_sum(
                            x + r.x as usize,
                            y + r.y as usize,
                            r.width as usize,
                            r.height as usize,
                        ) as f64
                })
                .sum();
            (raw / nf) as f32
        };

        for (si, stage) in self.cascade.stages.iter().enumerate() {
            let score: f32 = stage
                .classifiers
                .iter()
                .map(|weak| weak.evaluate(feature_value))
                .sum();
            if score < stage.threshold {
                return Verdict::Rejected(si);
            }
        }
        Verdict::Accepted
    }

    /// Raw window hits in original image coordinates, before grouping.
    pub fn scan(&self, gray: &GrayImage) -> Result<Vec<FaceRegion>> {
        let (width, height) = gray.dimensions();
        let (ww, wh) = (self.cascade.window_width, self.cascade.window_height);
        let min_size = self.params.min_size;
        let max_size = self.params.max_size.unwrap_or(u32::MAX);

        let mut hits = Vec::new();
        let mut factor = 1.0f64;
        loop {
            let win_w = (ww as f64 * factor).round() as u32;
            let win_h = (wh as f64 * factor).round() as u32;
            if win_w > width || win_h > height || win_w > max_size || win_h > max_size {
                break;
            }

            if win_w >= min_size && win_h >= min_size {
                let sw = (width as f64 / factor).round() as u32;
                let sh = (height as f64 / factor).round() as u32;
                if sw <= ww || sh <= wh {
                    break;
                }
                let scaled = resize_gray_bilinear(gray, sw, sh)?;
                let ii = IntegralImage::new(&scaled);
                let step = if factor > 2.0 { 1 } else { 2 };
                let (x_end, y_end) = ((sw - ww) as usize, (sh - wh) as usize);

                let before = hits.len();
                for y in (0..y_end).step_by(step) {
                    let mut x = 0;
                    while x < x_end {
                        match self.classify_window(&ii, x, y) {
                            Verdict::Accepted => hits.push(FaceRegion::new(
                                (x as f64 * factor).round() as i32,
                                (y as f64 * factor).round() as i32,
                                win_w as i32,
                                win_h as i32,
                            )),
                            // Rejected at the first stage: skip one extra position.
                            Verdict::Rejected(0) => x += step,
                            Verdict::Rejected(_) => {}
                        }
                        x += step;
                    }
                }
                debug!(
                    "Scale {:.3} ({}x{} window): {} hits",
                    factor,
                    win_w,
                    win_h,
                    hits.len() - before
                );
            }

            factor *= self.params.scale_factor;
        }
        Ok(hits)
    }
}

impl FaceDetector for HaarCascadeDetector {
    fn detect(&self, gray: &GrayImage) -> Result<Vec<FaceRegion>> {
        let hits = self.scan(gray)?;
        let grouped = group_rectangles(&hits, self.params.min_neighbors, self.params.group_eps);
        debug!("{} raw hits grouped into {} faces", hits.len(), grouped.len());
        Ok(grouped)
    }
}

fn similar(a: &FaceRegion, b: &FaceRegion, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    ((a.x - b.x).abs() as f64) <= delta
        && ((a.y - b.y).abs() as f64) <= delta
        && ((a.x + a.width - b.x - b.width).abs() as f64) <= delta
        && ((a.y + a.height - b.y - b.height).abs() as f64) <= delta
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge overlapping hits into averaged boxes.
///
/// Clusters with `min_neighbors` or fewer members are dropped, as are
/// clusters sitting inside a better-supported one. With `min_neighbors == 0`
/// the raw hits are returned untouched.
pub fn group_rectangles(rects: &[FaceRegion], min_neighbors: u32, eps: f64) -> Vec<FaceRegion> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let n = rects.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if similar(&rects[i], &rects[j], eps) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    // root -> (sum x, sum y, sum w, sum h, count)
    let mut clusters: Vec<(usize, [i64; 4], u32)> = Vec::new();
    for (i, r) in rects.iter().enumerate() {
        let root = find(&mut parent, i);
        let slot = match clusters.iter().position(|c| c.0 == root) {
            Some(pos) => pos,
            None => {
                clusters.push((root, [0; 4], 0));
                clusters.len() - 1
            }
        };
        let c = &mut clusters[slot];
        c.1[0] += r.x as i64;
        c.1[1] += r.y as i64;
        c.1[2] += r.width as i64;
        c.1[3] += r.height as i64;
        c.2 += 1;
    }

    let averaged: Vec<(FaceRegion, u32)> = clusters
        .iter()
        .map(|(_, sums, count)| {
            let s = 1.0 / *count as f64;
            let avg = |v: i64| (v as f64 * s).round() as i32;
            (
                FaceRegion::new(avg(sums[0]), avg(sums[1]), avg(sums[2]), avg(sums[3])),
                *count,
            )
        })
        .collect();

    let mut faces = Vec::new();
    for (i, (r1, n1)) in averaged.iter().enumerate() {
        if *n1 <= min_neighbors {
            continue;
        }
        let swallowed = averaged.iter().enumerate().any(|(j, (r2, n2))| {
            if i == j || *n2 <= min_neighbors {
                return false;
            }
            let dx = (r2.width as f64 * eps).round() as i32;
            let dy = (r2.height as f64 * eps).round() as i32;
            r1.x >= r2.x - dx
                && r1.y >= r2.y - dy
                && r1.x + r1.width <= r2.x + r2.width + dx
                && r1.y + r1.height <= r2.y + r2.height + dy
                && (*n2 > (*n1).max(3) || *n1 < 3)
        });
        if !swallowed {
            faces.push(*r1);
        }
    }
    faces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::cascade::tests::EDGE_CASCADE;
    use image::Luma;

    fn edge_detector(min_neighbors: u32) -> HaarCascadeDetector {
        let cascade = HaarCascade::from_xml(EDGE_CASCADE).unwrap();
        let params = DetectionParams {
            min_neighbors,
            ..DetectionParams::default()
        };
        HaarCascadeDetector::new(cascade, params).unwrap()
    }

    #[test]
    fn featureless_image_has_no_hits() {
        let gray = GrayImage::from_pixel(200, 200, Luma([128]));
        let faces = edge_detector(5).detect(&gray).unwrap();
        assert!(faces.is_empty());
    }

    #[test]
    fn horizontal_edge_is_found_at_its_row() {
        let gray = GrayImage::from_fn(200, 200, |_, y| Luma([if y < 100 { 0 } else { 255 }]));
        let faces = edge_detector(5).detect(&gray).unwrap();
        assert!(!faces.is_empty());
        for f in &faces {
            assert!(f.width >= 80 && f.height >= 80, "{f}");
            assert!(f.y <= 105 && f.y + f.height >= 95, "{f}");
        }
    }

    #[test]
    fn windows_below_min_size_are_skipped() {
        let gray = GrayImage::from_fn(60, 60, |_, y| Luma([if y < 30 { 0 } else { 255 }]));
        let hits = edge_detector(0).scan(&gray).unwrap();
        assert!(hits.is_empty());
    }

    fn tiny_window_detector() -> HaarCascadeDetector {
        let cascade = HaarCascade::from_xml(EDGE_CASCADE).unwrap();
        let params = DetectionParams {
            min_neighbors: 0,
            min_size: 0,
            ..DetectionParams::default()
        };
        HaarCascadeDetector::new(cascade, params).unwrap()
    }

    #[test]
    fn last_offset_of_a_level_is_not_scanned() {
        let gray = GrayImage::from_fn(26, 26, |_, y| Luma([if y < 13 { 0 } else { 255 }]));
        let hits = tiny_window_detector().scan(&gray).unwrap();
        assert_eq!(hits, vec![FaceRegion::new(0, 0, 24, 24)]);
    }

    #[test]
    fn image_no_larger_than_window_is_not_scanned() {
        let gray = GrayImage::from_fn(24, 24, |_, y| Luma([if y < 12 { 0 } else { 255 }]));
        assert!(tiny_window_detector().scan(&gray).unwrap().is_empty());
    }

    #[test]
    fn first_stage_rejection_skips_next_position() {
        // Only columns 24.. carry the edge, so x=0 fails stage 0 and x=2 is
        // skipped even though it would pass; x=4 is scanned and passes.
        let gray = GrayImage::from_fn(30, 26, |x, y| {
            Luma([if x >= 24 && y >= 12 { 255 } else { 0 }])
        });
        let hits = tiny_window_detector().scan(&gray).unwrap();
        assert_eq!(hits, vec![FaceRegion::new(4, 0, 24, 24)]);
    }

    #[test]
    fn scale_factor_must_grow() {
        let cascade = HaarCascade::from_xml(EDGE_CASCADE).unwrap();
        let params = DetectionParams {
            scale_factor: 1.0,
            ..DetectionParams::default()
        };
        assert!(matches!(
            HaarCascadeDetector::new(cascade, params),
            Err(Error::InvalidArgument { arg: "scale_factor", .. })
        ));
    }

    #[test]
    fn grouping_averages_cluster_and_drops_sparse_ones() {
        let mut rects: Vec<FaceRegion> =
            (0..6).map(|i| FaceRegion::new(100 + i, 50, 90, 90)).collect();
        rects.push(FaceRegion::new(400, 400, 90, 90));
        let faces = group_rectangles(&rects, 5, 0.2);
        assert_eq!(faces, vec![FaceRegion::new(103, 50, 90, 90)]);
    }

    #[test]
    fn grouping_suppresses_nested_weaker_cluster() {
        let mut rects: Vec<FaceRegion> =
            (0..10).map(|_| FaceRegion::new(0, 0, 200, 200)).collect();
        rects.extend((0..4).map(|_| FaceRegion::new(50, 50, 60, 60)));
        let faces = group_rectangles(&rects, 3, 0.2);
        assert_eq!(faces, vec![FaceRegion::new(0, 0, 200, 200)]);
    }

    #[test]
    fn zero_neighbors_returns_raw_hits() {
        let rects = vec![FaceRegion::new(1, 1, 10, 10), FaceRegion::new(2, 2, 10, 10)];
        assert_eq!(group_rectangles(&rects, 0, 0.2), rects);
    }
}
