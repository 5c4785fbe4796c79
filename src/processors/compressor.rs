// imgconv/src/processors/compressor.rs
use crate::core::{EncodeOptions, ImageConvError, PngCompression, Result, TargetFormat};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{self, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::ColorMap;
use image::{ColorType, DynamicImage, Frame};
use oxipng::{optimize_from_memory, Options};
use std::fs::{self, OpenOptions};
use std::io::{Cursor, Write};
use std::path::Path;

/// How an encoded image is put on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail if anything already exists at the path.
    CreateNew,
    Overwrite,
}

pub struct Compressor {
    options: EncodeOptions,
}

impl Compressor {
    pub fn new(options: EncodeOptions) -> Self {
        Self { options }
    }

    pub fn encode(&self, image: &DynamicImage, format: TargetFormat) -> Result<Vec<u8>> {
        log::debug!(
            "Encoding {}x{} image as {} ({:?})",
            image.width(),
            image.height(),
            format,
            self.options
        );

        let bytes = match format {
            TargetFormat::Jpeg => self.encode_jpeg(image),
            TargetFormat::Png => self.encode_png(image),
            TargetFormat::Gif => self.encode_gif(image),
            TargetFormat::Tiff => self.encode_tiff(image),
            TargetFormat::WebP => self.encode_webp(image),
        }
        .map_err(|e| match e {
            ImageConvError::Encode(_) => e,
            other => ImageConvError::Encode(format!("{} encoding failed: {}", format, other)),
        })?;

        Ok(bytes)
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.options.quality.max(1));
        rgb.write_with_encoder(encoder).map_err(encode_error)?;
        Ok(buffer)
    }

    fn encode_png(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let compression = match self.options.png_compression {
            PngCompression::Default => png::CompressionType::Default,
            PngCompression::Fast => png::CompressionType::Fast,
            PngCompression::Best => png::CompressionType::Best,
        };
        let filter = if self.options.png_predictor {
            png::FilterType::Adaptive
        } else {
            png::FilterType::NoFilter
        };

        let encoder = PngEncoder::new_with_quality(&mut buffer, compression, filter);
        match image.color() {
            ColorType::Rgb32F | ColorType::Rgba32F => {
                DynamicImage::ImageRgba16(image.to_rgba16()).write_with_encoder(encoder)
            }
            _ => image.write_with_encoder(encoder),
        }
        .map_err(encode_error)?;

        if self.options.optimize_png {
            return self.optimize_png_bytes(&buffer);
        }

        Ok(buffer)
    }

    fn encode_gif(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut rgba = image.to_rgba8();

        if self.options.max_colors < 256 {
            let palette = color_quant::NeuQuant::new(
                10,
                usize::from(self.options.max_colors),
                rgba.as_raw(),
            );
            if rgba.width() < 2 {
                // dither diffuses error into x + 1
                for pixel in rgba.pixels_mut() {
                    palette.map_color(pixel);
                }
            } else {
                image::imageops::dither(&mut rgba, &palette);
            }
        }

        let mut buffer = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut buffer, 10);
            encoder
                .encode_frame(Frame::new(rgba))
                .map_err(encode_error)?;
        }
        Ok(buffer)
    }

    fn encode_tiff(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
        rgba.write_with_encoder(TiffEncoder::new(&mut cursor))
            .map_err(encode_error)?;
        Ok(cursor.into_inner())
    }

    fn encode_webp(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        if self.options.webp_lossy {
            return Err(ImageConvError::UnsupportedFormat(
                "lossy WebP encoding is not available in this build".to_string(),
            ));
        }

        let mut buffer = Vec::new();
        let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
        rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buffer))
            .map_err(encode_error)?;
        Ok(buffer)
    }

    fn optimize_png_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        optimize_from_memory(data, &Options::default())
            .map_err(|e| ImageConvError::Encode(format!("PNG optimization failed: {}", e)))
    }

    /// Writes `bytes` to `path`. A partially written file is removed.
    pub fn save(&self, bytes: &[u8], path: &Path, mode: WriteMode) -> Result<u64> {
        let mut open = OpenOptions::new();
        open.write(true);
        match mode {
            WriteMode::CreateNew => open.create_new(true),
            WriteMode::Overwrite => open.create(true).truncate(true),
        };

        let mut file = open.open(path)?;
        let written = file.write_all(bytes).and_then(|_| file.sync_all());
        drop(file);

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(path) {
                log::warn!(
                    "Could not remove partial output {}: {}",
                    path.display(),
                    cleanup
                );
            }
            return Err(e.into());
        }

        log::info!(
            "Saved image: {} ({})",
            path.display(),
            crate::utils::format_file_size(bytes.len() as u64)
        );
        Ok(bytes.len() as u64)
    }
}

fn encode_error(e: image::ImageError) -> ImageConvError {
    ImageConvError::Encode(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::Loader;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn sample() -> DynamicImage {
        let image = RgbaImage::from_fn(24, 16, |x, y| {
            Rgba([(x * 10) as u8, (y * 15) as u8, 128, if x % 2 == 0 { 255 } else { 200 }])
        });
        DynamicImage::ImageRgba8(image)
    }

    #[test]
    fn every_target_produces_its_own_format() {
        let compressor = Compressor::new(EncodeOptions::default());
        let loader = Loader::new();
        let cases = [
            (TargetFormat::Gif, ImageFormat::Gif),
            (TargetFormat::Jpeg, ImageFormat::Jpeg),
            (TargetFormat::Png, ImageFormat::Png),
            (TargetFormat::Tiff, ImageFormat::Tiff),
            (TargetFormat::WebP, ImageFormat::WebP),
        ];

        for (target, expected) in cases {
            let bytes = compressor.encode(&sample(), target).unwrap();
            let (decoded, format) = loader.load_from_bytes(&bytes).unwrap();
            assert_eq!(format, expected);
            assert_eq!((decoded.width(), decoded.height()), (24, 16));
        }
    }

    #[test]
    fn jpeg_quality_changes_output_size() {
        let noisy = DynamicImage::ImageRgb8(image::RgbImage::from_fn(64, 64, |x, y| {
            image::Rgb([((x * 37 + y * 11) % 256) as u8, ((x * y) % 256) as u8, (y * 4) as u8])
        }));
        let high = Compressor::new(EncodeOptions::default().with_quality(100))
            .encode(&noisy, TargetFormat::Jpeg)
            .unwrap();
        let low = Compressor::new(EncodeOptions::default().with_quality(10))
            .encode(&noisy, TargetFormat::Jpeg)
            .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn optimized_png_still_decodes() {
        let compressor = Compressor::new(EncodeOptions::default().with_png_optimization(true));
        let bytes = compressor.encode(&sample(), TargetFormat::Png).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.to_rgba8(), sample().to_rgba8());
    }

    #[test]
    fn gif_palette_is_limited_to_max_colors() {
        let gradient = DynamicImage::ImageRgb8(image::RgbImage::from_fn(32, 32, |x, y| {
            image::Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8])
        }));
        let compressor = Compressor::new(EncodeOptions::default().with_max_colors(4));
        let bytes = compressor.encode(&gradient, TargetFormat::Gif).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        let colors: HashSet<[u8; 4]> = decoded.pixels().map(|p| p.0).collect();
        assert!(colors.len() <= 4, "got {} colors", colors.len());
    }

    #[test]
    fn gif_palette_limit_handles_single_column_images() {
        let compressor = Compressor::new(EncodeOptions::default().with_max_colors(16));
        for (width, height) in [(1, 1), (1, 7), (7, 1)] {
            let thin = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |_, y| {
                Rgba([(y * 30) as u8, 60, 200, 255])
            }));
            let bytes = compressor.encode(&thin, TargetFormat::Gif).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (width, height));
        }
    }

    #[test]
    fn lossy_webp_is_an_encode_failure() {
        let compressor = Compressor::new(EncodeOptions::default().with_webp_lossy(true));
        assert!(compressor.encode(&sample(), TargetFormat::WebP).is_err());
    }

    #[test]
    fn create_new_refuses_existing_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taken.png");
        std::fs::write(&path, b"original").unwrap();

        let compressor = Compressor::new(EncodeOptions::default());
        assert!(compressor.save(b"new", &path, WriteMode::CreateNew).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"original");

        let written = compressor.save(b"new", &path, WriteMode::Overwrite).unwrap();
        assert_eq!(written, 3);
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }
}
