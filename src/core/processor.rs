// imgconv/src/core/processor.rs
use super::{ConvertConfig, ImageConvError, Result};
use crate::processors::{Compressor, DestinationNamer, Loader, Resizer, WriteMode};
use crate::utils::base_name;
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Outcome of converting one source file.
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size_before: u64,
    pub size_after: u64,
}

/// The per-file pipeline: decode, resize, name, encode, write.
pub struct ImageConverter {
    config: ConvertConfig,
    loader: Loader,
    resizer: Resizer,
    compressor: Compressor,
}

impl ImageConverter {
    pub fn new(config: ConvertConfig) -> Result<Self> {
        config.validate()?;

        let resizer = Resizer::new(config.resize);
        let compressor = Compressor::new(config.encode.clone());

        Ok(Self {
            config,
            loader: Loader::new(),
            resizer,
            compressor,
        })
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Converts `input` into `output_dir` under a name claimed from `namer`.
    pub fn convert_into(
        &self,
        input: &Path,
        output_dir: &Path,
        namer: &DestinationNamer,
    ) -> Result<ConvertedFile> {
        let image = self.decode_and_resize(input)?;

        let base = base_name(input)?;
        let destination = namer.resolve(output_dir, &base, self.config.target.extension())?;

        self.encode_and_write(input, image, destination, WriteMode::CreateNew)
    }

    /// Converts `input` to exactly `output`, replacing whatever is there.
    pub fn convert_to(&self, input: &Path, output: &Path) -> Result<ConvertedFile> {
        if output.file_name().is_none() {
            return Err(ImageConvError::PathResolution(format!(
                "output path has no file name: {}",
                output.display()
            )));
        }

        let image = self.decode_and_resize(input)?;
        self.encode_and_write(input, image, output.to_path_buf(), WriteMode::Overwrite)
    }

    fn decode_and_resize(&self, input: &Path) -> Result<DynamicImage> {
        let (image, format) = self.loader.load(input)?;
        log::debug!("Decoded {} as {:?}", input.display(), format);

        if self.resizer.is_active() {
            self.resizer.resize(image)
        } else {
            Ok(image)
        }
    }

    fn encode_and_write(
        &self,
        input: &Path,
        image: DynamicImage,
        destination: PathBuf,
        mode: WriteMode,
    ) -> Result<ConvertedFile> {
        let bytes = self.compressor.encode(&image, self.config.target)?;
        drop(image);

        let size_after = self.compressor.save(&bytes, &destination, mode)?;
        let size_before = std::fs::metadata(input).map(|m| m.len()).unwrap_or(0);

        Ok(ConvertedFile {
            source: input.to_path_buf(),
            destination,
            size_before,
            size_after,
        })
    }
}
