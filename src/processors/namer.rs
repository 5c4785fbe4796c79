// imgconv/src/processors/namer.rs
use crate::core::{ImageConvError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Hands out destination paths that are unique for the lifetime of the namer.
///
/// A path is free when nothing exists at it on disk and no earlier call has
/// claimed it. Claims are kept in memory because the claiming task may not
/// have written its file yet.
#[derive(Debug, Default)]
pub struct DestinationNamer {
    claimed: Mutex<HashSet<PathBuf>>,
}

impl DestinationNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `base_dir/base_name.ext`, or the first free
    /// `base_dir/base_name_v{N}.ext` when that is taken.
    pub fn resolve(&self, base_dir: &Path, base_name: &str, ext: &str) -> Result<PathBuf> {
        Self::validate_components(base_name, ext)?;

        let mut version: u32 = 0;
        let mut candidate = base_dir.join(format!("{}.{}", base_name, ext));

        loop {
            while Self::exists(&candidate)? {
                version = Self::next_version(version, &candidate)?;
                candidate = Self::versioned(base_dir, base_name, ext, version);
            }

            {
                let mut claimed = self.claimed.lock().map_err(|_| {
                    ImageConvError::Processing("destination registry lock poisoned".to_string())
                })?;
                if claimed.insert(candidate.clone()) {
                    log::debug!("Claimed destination {}", candidate.display());
                    return Ok(candidate);
                }
            }

            // claimed by a task that has not written yet; keep counting up
            version = Self::next_version(version, &candidate)?;
            candidate = Self::versioned(base_dir, base_name, ext, version);
        }
    }

    /// Number of paths handed out so far.
    pub fn claimed_count(&self) -> usize {
        self.claimed.lock().map(|claimed| claimed.len()).unwrap_or(0)
    }

    fn versioned(base_dir: &Path, base_name: &str, ext: &str, version: u32) -> PathBuf {
        base_dir.join(format!("{}_v{}.{}", base_name, version, ext))
    }

    fn next_version(version: u32, candidate: &Path) -> Result<u32> {
        version.checked_add(1).ok_or_else(|| {
            ImageConvError::PathResolution(format!(
                "ran out of version numbers for {}",
                candidate.display()
            ))
        })
    }

    fn exists(candidate: &Path) -> Result<bool> {
        candidate.try_exists().map_err(|e| {
            ImageConvError::PathResolution(format!(
                "cannot check {}: {}",
                candidate.display(),
                e
            ))
        })
    }

    fn validate_components(base_name: &str, ext: &str) -> Result<()> {
        if base_name.is_empty() {
            return Err(ImageConvError::PathResolution(
                "empty destination file name".to_string(),
            ));
        }

        if base_name == ".." || base_name.contains(['/', '\\']) {
            return Err(ImageConvError::PathResolution(format!(
                "destination file name '{}' is not a plain file name",
                base_name
            )));
        }

        if ext.is_empty() || ext.contains(['/', '\\', '.']) {
            return Err(ImageConvError::PathResolution(format!(
                "invalid destination extension '{}'",
                ext
            )));
        }

        Ok(())
    }
}
