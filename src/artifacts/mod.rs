//! Artifact persistence for generated files

pub mod naming;
pub mod store;

pub use naming::ArtifactNamer;
pub use store::DirectoryStore;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Error types for artifact storage
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Invalid artifact filename: {0:?}")]
    InvalidFilename(String),

    #[error("Artifact already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Failed to write artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file materialized from an inline binary part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub filename: String,
    pub absolute_path: PathBuf,
    pub mime_type: String,
}

/// Trait for artifact storage backends
pub trait ArtifactStore: Send + Sync {
    /// Write `bytes` under `filename`, returning the absolute path
    ///
    /// A failed write must not leave a file behind under `filename`. Callers
    /// on the async runtime run this on the blocking thread pool.
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError>;
}
