use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, info};

use crate::error::Result;

/// Encoders in the `image` crate that cannot store an alpha channel.
fn drops_alpha(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Jpeg | ImageFormat::Pnm)
}

/// Write `image` to `path`, choosing the encoder from the file extension.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)?;
    if drops_alpha(format) {
        debug!("{:?} has no alpha channel; writing RGB", format);
        DynamicImage::ImageRgba8(image.clone())
            .into_rgb8()
            .save_with_format(path, format)?;
    } else {
        image.save_with_format(path, format)?;
    }
    info!(
        "Saved {}x{} {:?} to {:?}",
        image.width(),
        image.height(),
        format,
        path
    );
    Ok(())
}
