//! High-level, ergonomic library API: turn a red-backdrop photo into a
//! finished portrait in memory or straight to disk. Prefer these entrypoints
//! over the individual processing stages when embedding headshot.
use std::path::Path;

use image::RgbImage;
use tracing::info;

use crate::core::params::ProcessingParams;
use crate::core::processing::pipeline::{PipelineOutput, run_pipeline, run_pipeline_with_detector};
use crate::detect::{CascadeSource, FaceDetector};
use crate::error::Result;
use crate::io::reader::load_image;
use crate::io::writers::output::save_image;
use crate::io::writers::report::RunReport;
use crate::types::TargetSize;

/// Process an already decoded photo (no disk I/O apart from the cascade).
pub fn process_image(
    image: RgbImage,
    target: TargetSize,
    params: &ProcessingParams,
    cascade: &CascadeSource,
) -> Result<PipelineOutput> {
    run_pipeline(image, target, params, cascade)
}

/// Process a decoded photo using a caller-provided face detector.
pub fn process_image_with_detector(
    image: RgbImage,
    target: TargetSize,
    params: &ProcessingParams,
    detector: &dyn FaceDetector,
) -> Result<PipelineOutput> {
    run_pipeline_with_detector(image, target, params, detector)
}

/// Load `input`, process it and write the portrait to `output`.
///
/// The output encoder follows the extension of `output`. Returns a report
/// describing the run; writing it anywhere is up to the caller.
pub fn process_to_path(
    input: &Path,
    output: &Path,
    target: TargetSize,
    params: &ProcessingParams,
    cascade: &CascadeSource,
) -> Result<RunReport> {
    let image = load_image(input)?;
    let result = process_image(image, target, params, cascade)?;
    save_image(&result.image, output)?;
    info!(
        "Portrait written: {:?} ({} tie anchor)",
        output,
        result.face_source()
    );
    Ok(RunReport::from_output(&result).with_paths(input, output))
}
