use crate::core::{ConversionStats, ConvertConfig, ImageConvError, ImageConverter, Result};
use crate::processors::DestinationNamer;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct BatchProcessor {
    converter: ImageConverter,
    max_threads: usize,
    thread_pool: rayon::ThreadPool,
    show_progress: bool,
}

impl BatchProcessor {
    /// Builds a processor that keeps at most `max_threads` files in flight.
    pub fn new(config: ConvertConfig, max_threads: usize) -> Result<Self> {
        if max_threads == 0 {
            return Err(ImageConvError::InvalidParameter(
                "Concurrency limit must be at least 1".to_string(),
            ));
        }

        let converter = ImageConverter::new(config)?;

        // Initialize thread pool once
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_threads)
            .thread_name(|i| format!("imgconv-worker-{}", i))
            .build()
            .map_err(|e| {
                ImageConvError::Processing(format!("Failed to create thread pool: {}", e))
            })?;

        Ok(Self {
            converter,
            max_threads,
            thread_pool,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Converts every file under `input_dir` into `output_dir`.
    ///
    /// Per-file failures are collected into the returned stats; only setup
    /// problems (bad directories, unreadable tree) are returned as errors.
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        recursive: bool,
    ) -> Result<ConversionStats> {
        self.validate_paths(input_dir, output_dir)?;

        let input_dir = input_dir.canonicalize()?;
        let files = self.collect_files(&input_dir, recursive)?;

        if files.is_empty() {
            log::warn!("No files found in {}", input_dir.display());
            return Ok(ConversionStats::default());
        }

        log::info!(
            "Converting {} files from {} to {} with {} workers",
            files.len(),
            input_dir.display(),
            self.converter.config().target,
            self.max_threads
        );

        std::fs::create_dir_all(output_dir)?;
        let output_dir = output_dir.canonicalize()?;

        // Naming state lives exactly as long as this run
        let namer = DestinationNamer::new();
        let pb = self.create_progress_bar(files.len());

        let results: Vec<(PathBuf, Result<_>)> = self.thread_pool.install(|| {
            files
                .par_iter()
                .progress_with(pb.clone())
                .map(|input_path| {
                    let result = self.converter.convert_into(input_path, &output_dir, &namer);
                    (input_path.clone(), result)
                })
                .collect()
        });

        // Aggregate results
        let mut stats = ConversionStats::default();
        for (input_path, result) in results {
            match result {
                Ok(converted) => stats.record(converted),
                Err(e) => {
                    log::warn!("Skipped {}: {}", input_path.display(), e);
                    stats.record_failure(input_path, &e);
                }
            }
        }

        let savings = self.calculate_overall_savings(&stats);
        pb.finish_with_message(format!(
            "Converted {} files, {} failed ({:.1}% size reduction)",
            stats.converted,
            stats.failure_count(),
            savings
        ));

        Ok(stats)
    }

    fn collect_files(&self, input_dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
        let walker = if recursive {
            WalkDir::new(input_dir)
        } else {
            WalkDir::new(input_dir).max_depth(1)
        };

        let mut paths = Vec::new();
        for entry in walker.min_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                paths.push(entry.into_path());
            }
        }

        Ok(paths)
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }

    fn calculate_overall_savings(&self, stats: &ConversionStats) -> f64 {
        if stats.total_size_before == 0 {
            return 0.0;
        }

        let savings = (stats.total_size_before as f64 - stats.total_size_after as f64)
            / stats.total_size_before as f64
            * 100.0;
        savings.clamp(0.0, 100.0)
    }

    pub fn validate_paths(&self, input_dir: &Path, output_dir: &Path) -> Result<()> {
        if !input_dir.exists() {
            return Err(ImageConvError::InvalidParameter(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            )));
        }

        if !input_dir.is_dir() {
            return Err(ImageConvError::InvalidParameter(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        if output_dir.exists() && !output_dir.is_dir() {
            return Err(ImageConvError::InvalidParameter(format!(
                "Output path exists but is not a directory: {}",
                output_dir.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TargetFormat;

    #[test]
    fn pool_is_sized_to_the_concurrency_limit() {
        for limit in [1, 3, 8] {
            let processor =
                BatchProcessor::new(ConvertConfig::new(TargetFormat::Png), limit).unwrap();
            assert_eq!(processor.max_threads(), limit);
            assert_eq!(processor.thread_pool.install(rayon::current_num_threads), limit);
        }
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(matches!(
            BatchProcessor::new(ConvertConfig::new(TargetFormat::Png), 0),
            Err(ImageConvError::InvalidParameter(_))
        ));
    }
}
