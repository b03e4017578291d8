//! Streaming multimodal generation: request building, stream decoding and
//! demultiplexing into text and saved image artifacts

pub mod client;
pub mod demux;
pub mod gemini;
pub mod mime;
pub mod request;
pub mod response;
pub mod sse;
pub mod streaming;

use async_trait::async_trait;
use futures::stream::BoxStream;

pub use client::GenerationClient;
pub use gemini::{GeminiBackend, GeminiConfig};
pub use request::{ContentRequest, GenerationRequest};
pub use response::{GenerationError, GenerationResult, PartKind, ResponseChunk, ResponsePart};
pub use streaming::{GenerationObserver, NoopObserver};

/// Lazy sequence of response chunks; ends at stream end or after an error
pub type ChunkStream = BoxStream<'static, Result<ResponseChunk, GenerationError>>;

/// Trait for generation backends - allows for different implementations
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Start one streaming generation call
    async fn stream_generate(&self, request: ContentRequest) -> Result<ChunkStream, GenerationError>;
}
