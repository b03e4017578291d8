//! Workflow service - resolves step numbers and runs them through the client

use crate::catalog::{StepCatalog, WorkflowStep};
use crate::generation::{GenerationClient, GenerationObserver, GenerationResult};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Image extensions accepted as step input
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Thin request layer over the catalog and the generation client
#[derive(Debug, Clone)]
pub struct WorkflowService {
    catalog: Arc<StepCatalog>,
    client: GenerationClient,
}

impl WorkflowService {
    pub fn new(catalog: Arc<StepCatalog>, client: GenerationClient) -> Self {
        Self { catalog, client }
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    /// Steps in index order
    pub fn steps(&self) -> impl Iterator<Item = &WorkflowStep> {
        self.catalog.iter()
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    /// Run one workflow step
    ///
    /// `image_path` is checked against [`ALLOWED_IMAGE_EXTENSIONS`] before
    /// anything else, in place of an upload gate in front of this layer. A
    /// path with another extension fails the step whether or not the file
    /// exists; an allowed path that does not exist falls back to text only.
    pub async fn process_step(&self, step: u32, image_path: Option<&Path>) -> GenerationResult {
        self.process_step_with_observer(step, image_path, None).await
    }

    pub async fn process_step_with_observer(
        &self,
        step: u32,
        image_path: Option<&Path>,
        observer: Option<&dyn GenerationObserver>,
    ) -> GenerationResult {
        let Some(definition) = self.catalog.lookup(step) else {
            warn!("Requested unknown step {}", step);
            return GenerationResult::failed(format!("Invalid step number: {}", step));
        };

        if let Some(path) = image_path {
            if !is_allowed_image(path) {
                warn!("Rejected input image {}", path.display());
                return GenerationResult::failed(format!(
                    "Unsupported image format: {} (allowed: {})",
                    path.display(),
                    ALLOWED_IMAGE_EXTENSIONS.join(", ")
                ));
            }
        }

        info!("Processing step {}: {}", definition.index, definition.title);
        self.client
            .generate_with_observer(&definition.prompt_template, image_path, observer)
            .await
    }
}

/// Whether a path has one of the accepted image extensions
pub fn is_allowed_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ALLOWED_IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
