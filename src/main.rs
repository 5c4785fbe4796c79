use anyhow::{Context, Result};
use clap::Parser;
use imgconv::{
    plan_output, validate_config, BatchProcessor, Cli, Commands, ConvertConfig, DestinationNamer,
    EncodeArgs, ImageConverter, OutputPlan, ResizeArgs, TargetFormat,
};
use log::LevelFilter;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Convert {
            input,
            to,
            out,
            dst_dir,
            resize,
            encode,
        } => {
            let config = build_config(&to, &resize, &encode)?;
            process_convert(&input, out.as_deref(), dst_dir.as_deref(), config)?;
        }
        Commands::Dir {
            input,
            to,
            dst_dir,
            recursive,
            max_procs,
            no_progress,
            resize,
            encode,
        } => {
            let config = build_config(&to, &resize, &encode)?;
            let dst_dir = match dst_dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            process_dir(&input, &dst_dir, recursive, max_procs, !no_progress, config)?;
        }
    }

    Ok(())
}

/// Every configuration error surfaces here, before any file is touched.
fn build_config(to: &str, resize: &ResizeArgs, encode: &EncodeArgs) -> Result<ConvertConfig> {
    let target: TargetFormat = to.parse()?;
    let config = ConvertConfig::new(target)
        .with_encode(encode.to_options())
        .with_resize(resize.to_policy());
    validate_config(&config)?;
    Ok(config)
}

fn process_convert(
    input: &Path,
    out: Option<&Path>,
    dst_dir: Option<&Path>,
    config: ConvertConfig,
) -> Result<()> {
    let converter = ImageConverter::new(config)?;

    let converted = match plan_output(out, dst_dir)? {
        OutputPlan::Exact(path) => converter.convert_to(input, &path),
        OutputPlan::Versioned(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
            converter.convert_into(input, &dir, &DestinationNamer::new())
        }
    }
    .with_context(|| format!("failed to convert {}", input.display()))?;

    println!("Converted image saved to: {}", converted.destination.display());

    Ok(())
}

fn process_dir(
    input: &Path,
    dst_dir: &Path,
    recursive: bool,
    max_procs: usize,
    show_progress: bool,
    config: ConvertConfig,
) -> Result<()> {
    let processor = BatchProcessor::new(config, max_procs)?.with_progress(show_progress);

    let stats = processor.process_directory(input, dst_dir, recursive)?;

    println!(
        "Batch conversion complete. Converted {} files to: {}",
        stats.converted,
        dst_dir.display()
    );

    stats.into_result()?;
    Ok(())
}
