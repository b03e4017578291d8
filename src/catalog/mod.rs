//! Workflow step catalog
//!
//! The catalog is loaded once at startup from a declarative file mapping
//! step keys (`step_1`, `step_2`, ...) to a title, description and prompt.
//! It is immutable afterwards and shared read-only between requests.

pub mod source;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

pub use source::{SourceFormat, StepEntry};

/// Error types for catalog loading
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read step file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed step definitions: {0}")]
    Malformed(String),

    #[error("Invalid step key '{0}': expected step_<N> with N >= 1")]
    InvalidKey(String),

    #[error("Step keys '{first}' and '{second}' both resolve to step {index}")]
    DuplicateIndex {
        index: u32,
        first: String,
        second: String,
    },
}

/// One step of the workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowStep {
    pub index: u32,
    pub title: String,
    pub description: String,
    pub prompt_template: String,
}

/// Read-only table of workflow steps keyed by index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepCatalog {
    steps: BTreeMap<u32, WorkflowStep>,
}

impl StepCatalog {
    pub fn new(steps: impl IntoIterator<Item = WorkflowStep>) -> Self {
        Self {
            steps: steps.into_iter().map(|s| (s.index, s)).collect(),
        }
    }

    /// Load the catalog, degrading to an empty one on any error
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(catalog) => {
                info!("Loaded {} workflow step(s) from {}", catalog.len(), path.display());
                catalog
            }
            Err(e) => {
                error!("Error loading prompts from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load the catalog, reporting errors
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, SourceFormat::from_path(path))
    }

    /// Parse step definitions from a string
    pub fn parse(content: &str, format: SourceFormat) -> Result<Self, CatalogError> {
        let entries = source::parse_entries(content, format)?;

        let mut steps: BTreeMap<u32, (String, WorkflowStep)> = BTreeMap::new();
        for (key, entry) in entries {
            let index = source::parse_step_key(&key)?;
            if let Some((first, _)) = steps.get(&index) {
                return Err(CatalogError::DuplicateIndex {
                    index,
                    first: first.clone(),
                    second: key,
                });
            }
            steps.insert(index, (key, entry.into_step(index)));
        }

        Ok(Self {
            steps: steps.into_iter().map(|(i, (_, step))| (i, step)).collect(),
        })
    }

    pub fn lookup(&self, index: u32) -> Option<&WorkflowStep> {
        self.steps.get(&index)
    }

    /// Steps in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = &WorkflowStep> {
        self.steps.values()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
