use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "headshot",
    version,
    about = "Red-backdrop photo to profile portrait: gradient backdrop and a necktie"
)]
pub struct CliArgs {
    /// Input photo shot against a uniform red backdrop
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output image; the extension picks the format (png, jpg, ...)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output width in pixels (height follows the aspect ratio if omitted)
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels (width follows the aspect ratio if omitted)
    #[arg(long)]
    pub height: Option<u32>,

    /// Haar cascade XML for face detection.
    /// Defaults to haarcascade_frontalface_default.xml from a standard OpenCV install
    #[arg(long)]
    pub cascade: Option<PathBuf>,

    /// JSON file overriding keying, gradient, detection or tie parameters
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Write a JSON run report (sizes, face, tie geometry) to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
