//! Generation client - one consolidated result per streamed call

use crate::artifacts::{ArtifactNamer, ArtifactStore};
use crate::generation::demux::{DemuxOutput, Demultiplexer};
use crate::generation::{
    GenerationBackend, GenerationError, GenerationObserver, GenerationRequest, GenerationResult,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info};

/// Default deadline for a whole generation call, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Runs generation calls against a backend and stores produced images
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    store: Arc<dyn ArtifactStore>,
    timeout_secs: u64,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn GenerationBackend>, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            backend,
            store,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Generate from a prompt and optional input image
    ///
    /// Never fails: every error is folded into a failed [`GenerationResult`].
    pub async fn generate(&self, prompt_text: &str, input_image_path: Option<&Path>) -> GenerationResult {
        self.generate_with_observer(prompt_text, input_image_path, None)
            .await
    }

    /// Like [`generate`](Self::generate), reporting output to `observer` as it arrives
    pub async fn generate_with_observer(
        &self,
        prompt_text: &str,
        input_image_path: Option<&Path>,
        observer: Option<&dyn GenerationObserver>,
    ) -> GenerationResult {
        let mut request = GenerationRequest::new(prompt_text);
        if let Some(path) = input_image_path {
            request = request.with_image(path);
        }

        let outcome = match timeout(
            Duration::from_secs(self.timeout_secs),
            self.execute(request, observer),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(GenerationError::Timeout(self.timeout_secs)),
        };

        match outcome {
            Ok(output) => GenerationResult::succeeded(output.text, output.artifacts),
            Err(e) => {
                error!("Error in generate: {}", e);
                GenerationResult::failed(e.to_string())
            }
        }
    }

    async fn execute(
        &self,
        request: GenerationRequest,
        observer: Option<&dyn GenerationObserver>,
    ) -> Result<DemuxOutput, GenerationError> {
        let namer = ArtifactNamer::new();
        info!(
            "Starting generation (call {}, image: {})",
            namer.call_token(),
            request.input_image_path.is_some()
        );

        let content = request.into_content_request().await?;
        let stream = self.backend.stream_generate(content).await?;

        Demultiplexer::new(Arc::clone(&self.store), namer)
            .with_observer(observer)
            .run(stream)
            .await
    }
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}
