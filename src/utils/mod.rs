// imgconv/src/utils/mod.rs
use crate::core::{ImageConvError, Result};
use std::path::{Path, PathBuf};

/// Where a single-file conversion should write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPlan {
    /// Write to this exact path, replacing any existing file.
    Exact(PathBuf),
    /// Let a `DestinationNamer` pick a free name inside this directory.
    Versioned(PathBuf),
}

/// File name of `path` up to its first `.`, so `holiday.raw.png` gives `holiday`.
pub fn base_name(path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ImageConvError::PathResolution(format!(
                "no usable file name in {}",
                path.display()
            ))
        })?;

    let base = file_name.split('.').next().unwrap_or_default();
    if base.is_empty() {
        return Err(ImageConvError::PathResolution(format!(
            "cannot derive an output name from {}",
            path.display()
        )));
    }

    Ok(base.to_string())
}

/// Decides the output location for single-file mode.
///
/// An absolute `out` is used as given; a relative one is placed under
/// `dst_dir`, falling back to the working directory.
pub fn plan_output(out: Option<&Path>, dst_dir: Option<&Path>) -> Result<OutputPlan> {
    let dir = match dst_dir {
        Some(dir) => absolutize(dir)?,
        None => std::env::current_dir()?,
    };

    match out {
        Some(out) if out.is_absolute() => Ok(OutputPlan::Exact(out.to_path_buf())),
        Some(out) => Ok(OutputPlan::Exact(dir.join(out))),
        None => Ok(OutputPlan::Versioned(dir)),
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

pub fn image_format_to_string(format: image::ImageFormat) -> String {
    match format {
        image::ImageFormat::Jpeg => "JPEG",
        image::ImageFormat::Png => "PNG",
        image::ImageFormat::Gif => "GIF",
        image::ImageFormat::WebP => "WebP",
        image::ImageFormat::Tiff => "TIFF",
        image::ImageFormat::Bmp => "BMP",
        _ => "Unknown",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_stops_at_first_dot() {
        assert_eq!(base_name(Path::new("/a/b/holiday.raw.png")).unwrap(), "holiday");
        assert_eq!(base_name(Path::new("plain")).unwrap(), "plain");
    }

    #[test]
    fn dotfiles_have_no_base_name() {
        assert!(matches!(
            base_name(Path::new("/a/.hidden")),
            Err(ImageConvError::PathResolution(_))
        ));
        assert!(base_name(Path::new("/")).is_err());
    }

    #[test]
    fn absolute_out_wins_over_dst_dir() {
        let plan = plan_output(Some(Path::new("/tmp/x/out.png")), Some(Path::new("/srv"))).unwrap();
        assert_eq!(plan, OutputPlan::Exact(PathBuf::from("/tmp/x/out.png")));
    }

    #[test]
    fn relative_out_joins_dst_dir() {
        let plan = plan_output(Some(Path::new("out.png")), Some(Path::new("/srv/images"))).unwrap();
        assert_eq!(plan, OutputPlan::Exact(PathBuf::from("/srv/images/out.png")));

        let plan = plan_output(Some(Path::new("out.png")), None).unwrap();
        assert_eq!(
            plan,
            OutputPlan::Exact(std::env::current_dir().unwrap().join("out.png"))
        );
    }

    #[test]
    fn missing_out_is_versioned() {
        let plan = plan_output(None, Some(Path::new("/srv/images"))).unwrap();
        assert_eq!(plan, OutputPlan::Versioned(PathBuf::from("/srv/images")));
    }

    #[test]
    fn file_sizes_are_human_readable() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.00 MB");
    }
}
