//! Progress callbacks for streamed generation
//!
//! `GenerationClient::generate_with_observer` reports each text fragment and
//! each saved artifact to an observer as soon as the demultiplexer handles
//! it, so a front end can render output while the stream is still open.
//!
//! # Example
//!
//! ```no_run
//! use robogen::artifacts::GeneratedArtifact;
//! use robogen::generation::GenerationObserver;
//!
//! struct LivePrinter;
//!
//! impl GenerationObserver for LivePrinter {
//!     fn on_text(&self, text: &str) {
//!         print!("{}", text);
//!     }
//!
//!     fn on_artifact(&self, artifact: &GeneratedArtifact) {
//!         println!("\n[saved {}]", artifact.filename);
//!     }
//! }
//! ```

use crate::artifacts::GeneratedArtifact;

/// Receives demultiplexed output as it arrives
///
/// This trait is object-safe and can be used as `&dyn GenerationObserver`.
pub trait GenerationObserver: Send + Sync {
    /// Called for every non-empty text part, in arrival order
    fn on_text(&self, text: &str);

    /// Called after an image part has been written to storage
    fn on_artifact(&self, artifact: &GeneratedArtifact);
}

/// Observer that ignores everything
#[derive(Debug, Clone, Default)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {
    fn on_text(&self, _text: &str) {}

    fn on_artifact(&self, _artifact: &GeneratedArtifact) {}
}
