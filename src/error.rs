//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, image codec, JSON and cascade errors, and provides
//! semantic variants for argument validation and resize failures.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Cascade error: {0}")]
    Cascade(#[from] crate::detect::CascadeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Image dimensions must be greater than 0, got: {width}x{height}")]
    ZeroSize { width: u32, height: u32 },

    #[error("Resize error: {0}")]
    Resize(String),
}
