//! robogen - image-conditioned robot design workflow over a streaming multimodal model

pub mod artifacts;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod generation;
pub mod workflow;

// Re-export commonly used types
pub use artifacts::{ArtifactStore, DirectoryStore, GeneratedArtifact};
pub use catalog::{StepCatalog, WorkflowStep};
pub use config::AppConfig;
pub use generation::{GenerationBackend, GenerationClient, GenerationError, GenerationResult};
pub use workflow::WorkflowService;
