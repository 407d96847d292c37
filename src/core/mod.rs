//! Core processing building blocks: tuning parameters and the image stages
//! (keying, gradient, compositing, resize, tie) plus the pipeline that chains
//! them. These are internal primitives consumed by the high-level `api` module.
pub mod params;
pub mod processing;
