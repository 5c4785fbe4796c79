// imgconv/src/processors/mod.rs
mod batch;
mod compressor;
mod loader;
mod namer;
mod resizer;

pub use batch::BatchProcessor;
pub use compressor::{Compressor, WriteMode};
pub use loader::Loader;
pub use namer::DestinationNamer;
pub use resizer::{resolve_dimensions, Rect, Resizer};
