// imgconv/src/cli.rs
use crate::core::{EncodeOptions, Interpolator, PngCompression, ResizeMode, ResizePolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imgconv")]
#[command(about = "Convert and resize images, one file or whole directory trees at a time")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a single image file
    Convert {
        /// Source image
        input: PathBuf,

        /// Output format: gif, jpeg, png, tiff or webp
        #[arg(short, long)]
        to: String,

        /// Output file; an existing file at this path is overwritten
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Destination directory (defaults to the working directory)
        #[arg(short, long)]
        dst_dir: Option<PathBuf>,

        #[command(flatten)]
        resize: ResizeArgs,

        #[command(flatten)]
        encode: EncodeArgs,
    },
    /// Convert every file in a directory
    Dir {
        /// Source directory
        input: PathBuf,

        /// Output format: gif, jpeg, png, tiff or webp
        #[arg(short, long)]
        to: String,

        /// Destination directory (defaults to the working directory)
        #[arg(short, long)]
        dst_dir: Option<PathBuf>,

        /// Include all subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Maximum number of files processed in parallel
        #[arg(short = 'j', long, default_value = "10")]
        max_procs: usize,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,

        #[command(flatten)]
        resize: ResizeArgs,

        #[command(flatten)]
        encode: EncodeArgs,
    },
}

/// Resize directives. When several are given only the highest-ranked one
/// applies: width/height, scale-to-height, scale-to-width, max-side, min-side.
#[derive(Args, Debug, Clone)]
pub struct ResizeArgs {
    /// Output width in pixels; does not keep proportions
    #[arg(long, default_value = "0")]
    pub width: u32,

    /// Output height in pixels; does not keep proportions
    #[arg(long, default_value = "0")]
    pub height: u32,

    /// Output height in pixels, width follows proportionally
    #[arg(long, default_value = "0")]
    pub scale_to_height: u32,

    /// Output width in pixels, height follows proportionally
    #[arg(long, default_value = "0")]
    pub scale_to_width: u32,

    /// Size of the longest side in pixels
    #[arg(long, default_value = "0")]
    pub max_side: u32,

    /// Size of the shortest side in pixels
    #[arg(long, default_value = "0")]
    pub min_side: u32,

    /// Let max-side/min-side grow images
    #[arg(long)]
    pub allow_upsize: bool,

    /// Resampling filter
    #[arg(long, value_enum, default_value = "catmull-rom")]
    pub interpolator: InterpolatorArg,
}

impl ResizeArgs {
    pub fn to_policy(&self) -> ResizePolicy {
        let mode = ResizeMode::from_raw(
            self.width,
            self.height,
            self.scale_to_height,
            self.scale_to_width,
            self.max_side,
            self.min_side,
        );

        ResizePolicy::new(mode)
            .with_allow_upsize(self.allow_upsize)
            .with_interpolator(self.interpolator.into())
    }
}

#[derive(Args, Debug, Clone)]
pub struct EncodeArgs {
    /// JPEG quality (0-100)
    #[arg(short, long, default_value = "100")]
    pub quality: u8,

    /// Maximum number of colors in GIF output (1-256)
    #[arg(long, default_value = "256")]
    pub gif_colors: u16,

    /// PNG compression level
    #[arg(long, value_enum, default_value = "default")]
    pub png_compression: PngCompressionArg,

    /// Disable adaptive PNG row filtering
    #[arg(long)]
    pub no_png_predictor: bool,

    /// Run a lossless optimization pass over PNG output
    #[arg(long)]
    pub optimize_png: bool,

    /// Use lossy WebP compression
    #[arg(long)]
    pub webp_lossy: bool,
}

impl EncodeArgs {
    pub fn to_options(&self) -> EncodeOptions {
        EncodeOptions::default()
            .with_quality(self.quality)
            .with_max_colors(self.gif_colors)
            .with_png_compression(self.png_compression.into())
            .with_png_predictor(!self.no_png_predictor)
            .with_png_optimization(self.optimize_png)
            .with_webp_lossy(self.webp_lossy)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum InterpolatorArg {
    CatmullRom,
    NearestNeighbor,
    ApproxBiLinear,
}

impl From<InterpolatorArg> for Interpolator {
    fn from(arg: InterpolatorArg) -> Self {
        match arg {
            InterpolatorArg::CatmullRom => Interpolator::CatmullRom,
            InterpolatorArg::NearestNeighbor => Interpolator::NearestNeighbor,
            InterpolatorArg::ApproxBiLinear => Interpolator::ApproxBiLinear,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PngCompressionArg {
    Default,
    Fast,
    Best,
}

impl From<PngCompressionArg> for PngCompression {
    fn from(arg: PngCompressionArg) -> Self {
        match arg {
            PngCompressionArg::Default => PngCompression::Default,
            PngCompressionArg::Fast => PngCompression::Fast,
            PngCompressionArg::Best => PngCompression::Best,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_command_parses_with_defaults() {
        let cli = Cli::parse_from(["imgconv", "dir", "photos", "--to", "png"]);
        match cli.command {
            Commands::Dir {
                input,
                to,
                recursive,
                max_procs,
                resize,
                encode,
                ..
            } => {
                assert_eq!(input, PathBuf::from("photos"));
                assert_eq!(to, "png");
                assert!(!recursive);
                assert_eq!(max_procs, 10);
                assert_eq!(resize.to_policy(), ResizePolicy::default());
                assert_eq!(encode.to_options(), EncodeOptions::default());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn conflicting_resize_flags_keep_highest_rank() {
        let cli = Cli::parse_from([
            "imgconv",
            "convert",
            "a.png",
            "--to",
            "jpeg",
            "--max-side",
            "200",
            "--scale-to-height",
            "50",
            "--interpolator",
            "nearest-neighbor",
        ]);
        let Commands::Convert { resize, .. } = cli.command else {
            panic!("expected convert");
        };

        let policy = resize.to_policy();
        assert_eq!(policy.mode, ResizeMode::ScaleToHeight(50));
        assert_eq!(policy.interpolator, Interpolator::NearestNeighbor);
    }
}
