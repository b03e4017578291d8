//! Gemini streaming backend - calls `streamGenerateContent` over HTTPS

use crate::generation::request::ContentRequest;
use crate::generation::response::ApiErrorEnvelope;
use crate::generation::sse::decode_chunks;
use crate::generation::{ChunkStream, GenerationBackend, GenerationError};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use tracing::{debug, warn};

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Configuration for the Gemini backend
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`
    pub api_key: String,

    /// Model name, e.g. `gemini-2.5-flash-image-preview`
    pub model: String,

    /// Scheme and host of the API, without trailing slash
    pub base_url: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full URL of the SSE streaming endpoint for the configured model
    pub fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// HTTP client for the Gemini generative language API
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| GenerationError::Api(format!("Invalid API key header: {}", e)))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GenerationError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn stream_generate(&self, request: ContentRequest) -> Result<ChunkStream, GenerationError> {
        let url = self.config.stream_url();
        debug!(
            "POST {} with {} content part(s)",
            url,
            request.parts().len()
        );

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            warn!("Generation request failed with {}: {}", status, message);
            return Err(GenerationError::Api(format!("{}: {}", status, message)));
        }

        let body = response
            .bytes_stream()
            .map(|read| {
                read.map(|bytes| bytes.to_vec())
                    .map_err(|e| GenerationError::Transport(e.to_string()))
            })
            .boxed();

        Ok(decode_chunks(body))
    }
}

/// The service's own error message if the body is an error envelope
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.describe(),
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
