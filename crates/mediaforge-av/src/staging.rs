//! Per-job staging directories.
//!
//! A [`StagingArea`] owns a temporary directory for intermediate files such
//! as the lossless PNG handed from ImageMagick to ffmpeg. The directory is
//! removed by [`StagingArea::cleanup`] or, failing that, when the value is
//! dropped, so intermediates never outlive the job on either outcome.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory scoped to one conversion.
///
/// # Example
///
/// ```no_run
/// use mediaforge_av::StagingArea;
///
/// let staging = StagingArea::new(None, "job-1234").unwrap();
/// let intermediate = staging.file("staging.png");
/// // ... run passes that write `intermediate` ...
/// staging.cleanup().unwrap();
/// ```
#[derive(Debug)]
pub struct StagingArea {
    temp_dir: TempDir,
}

impl StagingArea {
    /// Create a staging directory under `base`, or the system temp dir.
    ///
    /// `label` becomes part of the directory name to make leftovers traceable.
    pub fn new(base: Option<&Path>, label: &str) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        let prefix = format!("mediaforge-{label}-");
        builder.prefix(&prefix);

        let temp_dir = match base {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| {
                    Error::Staging(format!("failed to create {}: {e}", dir.display()))
                })?;
                builder.tempdir_in(dir)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| Error::Staging(format!("failed to create temp dir: {e}")))?;

        Ok(Self { temp_dir })
    }

    /// Path to the staging directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path for a named file inside the staging directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Remove the directory and everything in it.
    pub fn cleanup(self) -> Result<()> {
        let path = self.temp_dir.path().to_path_buf();
        self.temp_dir
            .close()
            .map_err(|e| Error::Staging(format!("failed to remove {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn staging_paths() {
        let base = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(Some(base.path()), "abc").unwrap();

        assert!(staging.path().starts_with(base.path()));
        assert!(staging
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("mediaforge-abc-"));
        let file = staging.file("staging.png");
        assert!(file.starts_with(staging.path()));
        assert_eq!(file.file_name().unwrap(), "staging.png");
    }

    #[test]
    fn cleanup_removes_contents() {
        let staging = StagingArea::new(None, "cleanup").unwrap();
        let dir = staging.path().to_path_buf();
        fs::write(staging.file("staging.png"), b"png").unwrap();

        staging.cleanup().unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn drop_removes_directory() {
        let dir = {
            let staging = StagingArea::new(None, "drop").unwrap();
            fs::write(staging.file("partial"), b"x").unwrap();
            staging.path().to_path_buf()
        };
        assert!(!dir.exists());
    }

    #[test]
    fn missing_base_is_created() {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().join("nested").join("staging");
        let staging = StagingArea::new(Some(&base), "nested").unwrap();
        assert!(staging.path().starts_with(&base));
    }
}
