use std::path::Path;

use image::{ImageReader, RgbImage};
use tracing::info;

use crate::error::Result;

/// Decode a photo from disk, sniffing the format from its contents.
///
/// Any alpha channel is discarded; keying builds its own.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    info!(
        "Loaded {:?}: {}x{} {:?}",
        path,
        decoded.width(),
        decoded.height(),
        decoded.color()
    );
    Ok(decoded.into_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use image::{Rgb, Rgba, RgbaImage};

    #[test]
    fn missing_file_is_io_error() {
        let err = load_image(Path::new("/nonexistent/photo.png")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn alpha_is_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        RgbaImage::from_pixel(3, 2, Rgba([200, 10, 10, 40]))
            .save(&path)
            .unwrap();
        let img = load_image(&path).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(*img.get_pixel(0, 0), Rgb([200, 10, 10]));
    }

    #[test]
    fn garbage_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(load_image(&path), Err(Error::Image(_))));
    }
}
