pub mod cli;
mod core;
mod processors;
mod utils;

pub use cli::{Cli, Commands, EncodeArgs, ResizeArgs};
pub use crate::core::{
    validate_config, ConversionStats, ConvertConfig, ConvertedFile, EncodeOptions, ImageConvError,
    ImageConverter, Interpolator, PngCompression, ResizeMode, ResizePolicy, Result, TargetFormat,
};
pub use crate::processors::{
    resolve_dimensions, BatchProcessor, Compressor, DestinationNamer, Loader, Rect, Resizer,
    WriteMode,
};
pub use crate::utils::{base_name, format_file_size, plan_output, OutputPlan};

// Re-export commonly used types
pub use image::DynamicImage;
