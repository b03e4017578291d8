//! Test utility functions for robogen
#![allow(dead_code)]

use robogen::artifacts::{ArtifactStore, DirectoryStore};
use robogen::catalog::{SourceFormat, StepCatalog};
use robogen::generation::request::ContentRequest;
use robogen::generation::{
    ChunkStream, GenerationBackend, GenerationClient, GenerationError, ResponseChunk, ResponsePart,
};

use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PROMPTS: &str = r#"{
    "step_1": {"title": "Concept", "description": "Initial sketch", "prompt": "Sketch a delivery robot"},
    "step_2": {"title": "Refine", "description": "Add detail", "prompt": "Refine the attached design"}
}"#;

/// Stub backend that replays the same scripted stream on every call
pub struct StubBackend {
    script: Vec<Result<ResponseChunk, String>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ContentRequest>>,
}

impl StubBackend {
    pub fn new(chunks: Vec<ResponseChunk>) -> Self {
        Self::scripted(chunks.into_iter().map(Ok).collect())
    }

    /// `Err` entries become transport failures at that point in the stream
    pub fn scripted(script: Vec<Result<ResponseChunk, String>>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ContentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for StubBackend {
    async fn stream_generate(&self, request: ContentRequest) -> Result<ChunkStream, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        let items: Vec<Result<ResponseChunk, GenerationError>> = self
            .script
            .iter()
            .cloned()
            .map(|item| item.map_err(GenerationError::Transport))
            .collect();
        Ok(stream::iter(items).boxed())
    }
}

pub fn text_chunk(text: &str) -> ResponseChunk {
    ResponseChunk::from_parts(vec![ResponsePart::text(text)])
}

pub fn image_chunk(mime_type: &str, bytes: &[u8]) -> ResponseChunk {
    ResponseChunk::from_parts(vec![ResponsePart::inline(mime_type, bytes.to_vec())])
}

pub fn catalog() -> Arc<StepCatalog> {
    Arc::new(StepCatalog::parse(PROMPTS, SourceFormat::Json).unwrap())
}

/// Client writing into `dir`, sharing `backend` with the caller
pub fn client_for(backend: Arc<StubBackend>, dir: &tempfile::TempDir) -> GenerationClient {
    let store: Arc<dyn ArtifactStore> = Arc::new(DirectoryStore::new(dir.path()).unwrap());
    GenerationClient::new(backend, store)
}

/// Sorted names of everything in `dir`
pub fn files_in(dir: &tempfile::TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
