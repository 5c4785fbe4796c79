// imgconv/src/core/mod.rs
pub mod processor;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub use processor::{ConvertedFile, ImageConverter};

/// Resampling filter used when a resize policy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolator {
    #[default]
    CatmullRom,
    NearestNeighbor,
    ApproxBiLinear,
}

/// The single dimensioning directive active for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    #[default]
    None,
    Absolute {
        width: Option<u32>,
        height: Option<u32>,
    },
    ScaleToHeight(u32),
    ScaleToWidth(u32),
    MaxSide(u32),
    MinSide(u32),
}

impl ResizeMode {
    /// Picks one mode out of the raw resize inputs. Zero means unset.
    ///
    /// Absolute dimensions win over scale-to-height, which wins over
    /// scale-to-width, then max side, then min side. Lower-ranked inputs are
    /// dropped.
    pub fn from_raw(
        width: u32,
        height: u32,
        scale_to_height: u32,
        scale_to_width: u32,
        max_side: u32,
        min_side: u32,
    ) -> Self {
        let set = |v: u32| (v > 0).then_some(v);

        if width > 0 || height > 0 {
            ResizeMode::Absolute {
                width: set(width),
                height: set(height),
            }
        } else if scale_to_height > 0 {
            ResizeMode::ScaleToHeight(scale_to_height)
        } else if scale_to_width > 0 {
            ResizeMode::ScaleToWidth(scale_to_width)
        } else if max_side > 0 {
            ResizeMode::MaxSide(max_side)
        } else if min_side > 0 {
            ResizeMode::MinSide(min_side)
        } else {
            ResizeMode::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizePolicy {
    pub mode: ResizeMode,
    pub allow_upsize: bool,
    pub interpolator: Interpolator,
}

impl ResizePolicy {
    pub fn new(mode: ResizeMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_allow_upsize(mut self, allow_upsize: bool) -> Self {
        self.allow_upsize = allow_upsize;
        self
    }

    pub fn with_interpolator(mut self, interpolator: Interpolator) -> Self {
        self.interpolator = interpolator;
        self
    }

    pub fn is_active(&self) -> bool {
        self.mode != ResizeMode::None
    }

    pub fn validate(&self) -> Result<()> {
        let zero = match self.mode {
            ResizeMode::Absolute { width, height } => width == Some(0) || height == Some(0),
            ResizeMode::ScaleToHeight(n)
            | ResizeMode::ScaleToWidth(n)
            | ResizeMode::MaxSide(n)
            | ResizeMode::MinSide(n) => n == 0,
            ResizeMode::None => false,
        };

        if zero {
            return Err(ImageConvError::InvalidParameter(format!(
                "Resize dimensions must be greater than zero: {:?}",
                self.mode
            )));
        }

        Ok(())
    }
}

/// Output formats the encoder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    Gif,
    Jpeg,
    Png,
    Tiff,
    WebP,
}

impl TargetFormat {
    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Gif => "gif",
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
            TargetFormat::Tiff => "tiff",
            TargetFormat::WebP => "webp",
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            TargetFormat::Gif => image::ImageFormat::Gif,
            TargetFormat::Jpeg => image::ImageFormat::Jpeg,
            TargetFormat::Png => image::ImageFormat::Png,
            TargetFormat::Tiff => image::ImageFormat::Tiff,
            TargetFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

impl FromStr for TargetFormat {
    type Err = ImageConvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gif" | "image/gif" => Ok(TargetFormat::Gif),
            "jpeg" | "jpg" | "image/jpeg" => Ok(TargetFormat::Jpeg),
            "png" | "image/png" => Ok(TargetFormat::Png),
            "tiff" | "tif" | "image/tiff" => Ok(TargetFormat::Tiff),
            "webp" | "image/webp" => Ok(TargetFormat::WebP),
            other => Err(ImageConvError::UnsupportedFormat(format!(
                "'{}' (supported: gif, jpeg, png, tiff, webp)",
                other
            ))),
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngCompression {
    #[default]
    Default,
    Fast,
    Best,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// JPEG quality, 0-100.
    pub quality: u8,
    /// GIF palette size, 1-256.
    pub max_colors: u16,
    pub png_compression: PngCompression,
    /// Adaptive PNG row filtering.
    pub png_predictor: bool,
    pub optimize_png: bool,
    pub webp_lossy: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            quality: 100,
            max_colors: 256,
            png_compression: PngCompression::Default,
            png_predictor: true,
            optimize_png: false,
            webp_lossy: false,
        }
    }
}

impl EncodeOptions {
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.min(100);
        self
    }

    pub fn with_max_colors(mut self, max_colors: u16) -> Self {
        self.max_colors = max_colors.clamp(1, 256);
        self
    }

    pub fn with_png_compression(mut self, compression: PngCompression) -> Self {
        self.png_compression = compression;
        self
    }

    pub fn with_png_predictor(mut self, predictor: bool) -> Self {
        self.png_predictor = predictor;
        self
    }

    pub fn with_png_optimization(mut self, optimize: bool) -> Self {
        self.optimize_png = optimize;
        self
    }

    pub fn with_webp_lossy(mut self, lossy: bool) -> Self {
        self.webp_lossy = lossy;
        self
    }
}

/// Everything a conversion needs besides the files themselves.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub target: TargetFormat,
    pub encode: EncodeOptions,
    pub resize: ResizePolicy,
}

impl ConvertConfig {
    pub fn new(target: TargetFormat) -> Self {
        Self {
            target,
            encode: EncodeOptions::default(),
            resize: ResizePolicy::default(),
        }
    }

    pub fn with_encode(mut self, encode: EncodeOptions) -> Self {
        self.encode = encode;
        self
    }

    pub fn with_resize(mut self, resize: ResizePolicy) -> Self {
        self.resize = resize;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.encode.quality > 100 {
            return Err(ImageConvError::InvalidParameter(
                "Quality must be between 0 and 100".to_string(),
            ));
        }

        if self.encode.max_colors == 0 || self.encode.max_colors > 256 {
            return Err(ImageConvError::InvalidParameter(
                "GIF color count must be between 1 and 256".to_string(),
            ));
        }

        if self.target == TargetFormat::WebP && self.encode.webp_lossy {
            return Err(ImageConvError::UnsupportedFormat(
                "lossy WebP encoding is not available in this build; drop --webp-lossy for lossless output"
                    .to_string(),
            ));
        }

        self.resize.validate()
    }
}

/// Aggregate result of a run.
#[derive(Debug, Default)]
pub struct ConversionStats {
    pub converted: usize,
    pub total_size_before: u64,
    pub total_size_after: u64,
    pub outputs: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, String)>,
}

impl ConversionStats {
    pub fn record(&mut self, file: ConvertedFile) {
        self.converted += 1;
        self.total_size_before += file.size_before;
        self.total_size_after += file.size_after;
        self.outputs.push(file.destination);
    }

    pub fn record_failure(&mut self, source: PathBuf, error: &ImageConvError) {
        self.errors.push((source, error.to_string()));
    }

    pub fn failure_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turns a run with failed files into `PartialFailure`.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ImageConvError::PartialFailure {
                count: self.failure_count(),
            })
        }
    }
}

#[derive(Error, Debug)]
pub enum ImageConvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid destination path: {0}")]
    PathResolution(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("ignored {count} error(s)")]
    PartialFailure { count: usize },
}

pub type Result<T> = std::result::Result<T, ImageConvError>;

pub fn validate_config(config: &ConvertConfig) -> Result<()> {
    config.validate()
}
