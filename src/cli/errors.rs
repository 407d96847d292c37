use std::path::PathBuf;

use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{arg} must be greater than 0")]
    ZeroSize { arg: &'static str },

    #[error("Failed to load params file {path:?}: {source}")]
    Params {
        path: PathBuf,
        #[source]
        source: headshot::Error,
    },

    #[error(transparent)]
    Headshot(#[from] headshot::Error),
}
