use image::{RgbImage, RgbaImage};
use tracing::{debug, info};

use crate::core::params::ProcessingParams;
use crate::core::processing::composite::compose_over;
use crate::core::processing::gradient::vertical_gradient;
use crate::core::processing::keying::remove_background;
use crate::core::processing::resize::{calculate_target_dimensions, resize_rgb_image};
use crate::core::processing::tie::{TieGeometry, render_tie};
use crate::detect::{CascadeSource, FaceDetector, detect_primary_face};
use crate::error::Result;
use crate::types::{FaceRegion, FaceSource, TargetSize};

/// Everything the pipeline produced for one photo.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub image: RgbaImage,
    pub source_dimensions: (u32, u32),
    pub face: Option<FaceRegion>,
    pub tie: TieGeometry,
}

impl PipelineOutput {
    pub fn face_source(&self) -> FaceSource {
        self.tie.anchor.source
    }
}

/// Resize to the requested size, or hand the photo back untouched.
pub fn prepare_input(image: RgbImage, target: TargetSize) -> Result<RgbImage> {
    let (ow, oh) = image.dimensions();
    let (tw, th) = calculate_target_dimensions(ow, oh, target)?;
    if (tw, th) == (ow, oh) {
        debug!("Keeping original size {}x{}", ow, oh);
        return Ok(image);
    }
    resize_rgb_image(&image, tw, th)
}

/// Key out the backdrop and put the subject on the gradient.
pub fn replace_background(image: &RgbImage, params: &ProcessingParams) -> Result<RgbaImage> {
    let subject = remove_background(image, &params.keying);
    let background = vertical_gradient(
        image.width(),
        image.height(),
        params.gradient.top,
        params.gradient.bottom,
    );
    compose_over(&subject, &background)
}

/// Full run with a caller-supplied detection step.
///
/// `detect` receives the composited image and is only called once the
/// background has been replaced.
pub fn run_pipeline_with<F>(
    image: RgbImage,
    target: TargetSize,
    params: &ProcessingParams,
    detect: F,
) -> Result<PipelineOutput>
where
    F: FnOnce(&RgbaImage) -> Result<Option<FaceRegion>>,
{
    let source_dimensions = image.dimensions();
    let image = prepare_input(image, target)?;
    info!(
        "Processing {}x{} (source {}x{})",
        image.width(),
        image.height(),
        source_dimensions.0,
        source_dimensions.1
    );

    let composite = replace_background(&image, params)?;
    drop(image);

    let face = detect(&composite)?;
    let (image, tie) = render_tie(&composite, face.as_ref(), &params.tie);

    Ok(PipelineOutput {
        image,
        source_dimensions,
        face,
        tie,
    })
}

/// Full run using the Haar cascade from `cascade`, parsed when detection starts.
pub fn run_pipeline(
    image: RgbImage,
    target: TargetSize,
    params: &ProcessingParams,
    cascade: &CascadeSource,
) -> Result<PipelineOutput> {
    run_pipeline_with(image, target, params, |composite| {
        let detector = cascade.load(params.detection)?;
        detect_primary_face(composite, detector.as_ref().map(|d| d as &dyn FaceDetector))
    })
}

/// Full run with an already constructed detector.
pub fn run_pipeline_with_detector(
    image: RgbImage,
    target: TargetSize,
    params: &ProcessingParams,
    detector: &dyn FaceDetector,
) -> Result<PipelineOutput> {
    run_pipeline_with(image, target, params, |composite| {
        detect_primary_face(composite, Some(detector))
    })
}
