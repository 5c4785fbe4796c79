// imgconv/src/processors/loader.rs
use crate::core::{ImageConvError, Result};
use crate::utils::image_format_to_string;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// Decodes local image files, sniffing the format from content.
#[derive(Clone, Default)]
pub struct Loader;

impl Loader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, path: &Path) -> Result<(DynamicImage, ImageFormat)> {
        log::debug!("Loading image from: {}", path.display());

        self.validate_path(path)?;

        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| ImageConvError::Decode(format!("{}: {}", path.display(), e)))?;

        let format = reader.format().ok_or_else(|| {
            ImageConvError::Decode(format!("{}: unrecognized image format", path.display()))
        })?;

        let image = reader
            .decode()
            .map_err(|e| ImageConvError::Decode(format!("{}: {}", path.display(), e)))?;

        log::debug!(
            "Loaded image: {}x{} pixels, format: {}, color: {:?}",
            image.width(),
            image.height(),
            image_format_to_string(format),
            image.color()
        );

        Ok((image, format))
    }

    pub fn load_from_bytes(&self, data: &[u8]) -> Result<(DynamicImage, ImageFormat)> {
        let format = image::guess_format(data)
            .map_err(|e| ImageConvError::Decode(format!("unrecognized image data: {}", e)))?;
        let image = image::load_from_memory_with_format(data, format)
            .map_err(|e| ImageConvError::Decode(format!("failed to decode image from bytes: {}", e)))?;

        Ok((image, format))
    }

    fn validate_path(&self, path: &Path) -> Result<()> {
        let metadata = path
            .metadata()
            .map_err(|e| ImageConvError::Decode(format!("{}: {}", path.display(), e)))?;

        if metadata.len() == 0 {
            return Err(ImageConvError::Decode(format!(
                "File is empty: {}",
                path.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detects_format_from_content_not_extension() {
        let dir = TempDir::new().unwrap();
        let png_path = dir.path().join("actually_png.png");
        image::RgbImage::new(4, 3).save(&png_path).unwrap();

        let misnamed = dir.path().join("actually_png.jpg");
        std::fs::rename(&png_path, &misnamed).unwrap();

        let (image, format) = Loader::new().load(&misnamed).unwrap();
        assert_eq!(format, ImageFormat::Png);
        assert_eq!((image.width(), image.height()), (4, 3));
    }

    #[test]
    fn garbage_and_empty_files_fail_to_decode() {
        let dir = TempDir::new().unwrap();
        let garbage = dir.path().join("broken.png");
        std::fs::write(&garbage, b"definitely not an image").unwrap();
        let empty = dir.path().join("empty.png");
        std::fs::write(&empty, b"").unwrap();

        let loader = Loader::new();
        assert!(matches!(loader.load(&garbage), Err(ImageConvError::Decode(_))));
        assert!(matches!(loader.load(&empty), Err(ImageConvError::Decode(_))));
        assert!(matches!(
            loader.load(&dir.path().join("missing.png")),
            Err(ImageConvError::Decode(_))
        ));
    }
}
