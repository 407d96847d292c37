#![doc = r##"
headshot: turn a red-backdrop photo into a profile portrait.

The pipeline keys out a uniform red backdrop with HSV thresholds and
morphology, lays the subject over a soft light-blue gradient, finds the face
with an OpenCV Haar cascade, and draws a navy necktie under the chin. It
powers the `headshot` CLI and can be embedded in your own Rust applications.

Stability
---------
The public library API is experimental in initial releases and may evolve.
Breaking changes can occur.

Requirements
------------
- Rust 2024 edition toolchain.
- For face detection, an OpenCV Haar cascade XML file such as
  `haarcascade_frontalface_default.xml`. Standard OpenCV install locations
  are searched automatically; without one the tie is placed at a default
  position.

Quick start: process a photo to a file
--------------------------------------
```rust,no_run
use std::path::Path;
use headshot::{process_to_path, CascadeSource, ProcessingParams, TargetSize};

fn main() -> headshot::Result<()> {
    let report = process_to_path(
        Path::new("/photos/me_red.jpg"),
        Path::new("/out/me.png"),
        TargetSize::new(Some(600), None),
        &ProcessingParams::default(),
        &CascadeSource::Search,
    )?;
    println!("tie anchored from {} face", report.face_source);
    Ok(())
}
```

Process in memory
-----------------
```rust,no_run
use headshot::{process_image, CascadeSource, ProcessingParams, TargetSize};

fn main() -> headshot::Result<()> {
    let photo = image::open("/photos/me_red.jpg")?.into_rgb8();
    let out = process_image(
        photo,
        TargetSize::default(),
        &ProcessingParams::default(),
        &CascadeSource::Path("/opt/cascades/frontalface.xml".into()),
    )?;

    // `out.image` is the finished RGBA portrait; `out.face` and `out.tie`
    // describe where the tie went.
    println!("{:?} -> tip at y={}", out.face, out.tie.tip_y);
    Ok(())
}
```

Tuning parameters
-----------------
Every threshold, kernel size, color and proportion lives in
[`ProcessingParams`]. It deserializes from JSON with every field optional:

```rust
use headshot::ProcessingParams;

let params: ProcessingParams =
    serde_json::from_str(r#"{ "keying": { "border_kernel": 15 } }"#).unwrap();
assert_eq!(params.keying.border_kernel, 15);
assert_eq!(params.detection.min_neighbors, 5);
```

Custom face detectors
---------------------
Implement [`FaceDetector`] to swap in another backend and pass it to
[`process_image_with_detector`].

Error handling
--------------
All public functions return `headshot::Result<T>`; match on `headshot::Error`
to handle specific cases.

```rust,no_run
use std::path::Path;
use headshot::{process_to_path, CascadeSource, Error, ProcessingParams, TargetSize};

fn main() {
    let params = ProcessingParams::default();
    match process_to_path(
        Path::new("/bad/path.jpg"),
        Path::new("/out.png"),
        TargetSize::default(),
        &params,
        &CascadeSource::Search,
    ) {
        Ok(_) => {}
        Err(Error::Io(e)) => eprintln!("I/O error: {e}"),
        Err(Error::Cascade(e)) => eprintln!("Cascade error: {e}"),
        Err(other) => eprintln!("Other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`]: high-level, ergonomic entry points.
- [`core`]: tuning parameters and the individual image stages.
- [`detect`]: Haar cascade parsing, multi-scale detection and grouping.
- [`types`]: shared types (`FaceRegion`, `TargetSize`, colors).
- [`io`]: image reader, image and report writers.
- [`error`]: crate-level `Error` and `Result`.
"##]

// Core modules (public)
pub mod api;
pub mod core;
pub mod detect;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::{
    DetectionParams, GradientParams, HsvRange, KeyingParams, ProcessingParams, TieParams,
};
pub use crate::core::processing::pipeline::PipelineOutput;
pub use crate::core::processing::tie::{TieAnchor, TieGeometry};
pub use error::{Error, Result};
pub use types::{FaceRegion, FaceSource, Rgb, Rgba, TargetSize};

// Detection
pub use detect::{CascadeError, CascadeSource, FaceDetector, HaarCascade, HaarCascadeDetector};

// Writers
pub use io::writers::{RunReport, save_image, write_report};

// High-level API re-exports
pub use api::{process_image, process_image_with_detector, process_to_path};
