use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::processing::pipeline::PipelineOutput;
use crate::core::processing::tie::TieGeometry;
use crate::error::Result;
use crate::types::{FaceRegion, FaceSource};

/// JSON summary of one run, written next to (or apart from) the output image.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: &'static str,
    pub processed_at: DateTime<Utc>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub source_size: Dimensions,
    pub output_size: Dimensions,
    pub face: Option<FaceRegion>,
    pub face_source: FaceSource,
    pub tie: TieGeometry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl RunReport {
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            processed_at: Utc::now(),
            input: None,
            output: None,
            source_size: output.source_dimensions.into(),
            output_size: output.image.dimensions().into(),
            face: output.face,
            face_source: output.face_source(),
            tie: output.tie.clone(),
        }
    }

    pub fn with_paths(mut self, input: &Path, output: &Path) -> Self {
        self.input = Some(input.to_path_buf());
        self.output = Some(output.to_path_buf());
        self
    }
}

/// Serialize `report` as pretty JSON to `path`.
pub fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json_string)?;
    info!("Wrote run report: {:?}", path);
    Ok(())
}
