//! Filesystem-backed artifact store

use crate::artifacts::{ArtifactError, ArtifactStore};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{error, info};

/// Writes artifacts into a single output directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open (creating if needed) the output directory
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        let root = dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve output directory {}", dir.display()))?;

        Ok(Self { root })
    }

    /// Absolute path of the output directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_atomic(&self, target: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
        let io_err = |source: std::io::Error| ArtifactError::Io {
            path: target.to_path_buf(),
            source,
        };

        // The temp file lives next to the target so the final rename stays on
        // one filesystem. Dropping it on any error path removes it.
        let mut tmp = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(&self.root)
            .map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;

        persist(tmp, target)
    }
}

fn persist(tmp: NamedTempFile, target: &Path) -> Result<(), ArtifactError> {
    match tmp.persist_noclobber(target) {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(ArtifactError::AlreadyExists(target.to_path_buf()))
        }
        Err(e) => Err(ArtifactError::Io {
            path: target.to_path_buf(),
            source: e.error,
        }),
    }
}

/// A bare file name: one normal path component, nothing hidden
fn validate_filename(filename: &str) -> Result<(), ArtifactError> {
    let mut components = Path::new(filename).components();
    let valid = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !filename.starts_with('.');

    if valid {
        Ok(())
    } else {
        Err(ArtifactError::InvalidFilename(filename.to_string()))
    }
}

impl ArtifactStore for DirectoryStore {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        let result = validate_filename(filename).and_then(|()| {
            let target = self.root.join(filename);
            self.write_atomic(&target, bytes).map(|()| target)
        });

        match &result {
            Ok(path) => info!("File saved to: {}", path.display()),
            Err(e) => error!("Error saving file {}: {}", filename, e),
        }

        result
    }
}
