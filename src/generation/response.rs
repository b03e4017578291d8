//! Response types for streamed generation

use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use thiserror::Error;

use crate::artifacts::GeneratedArtifact;

/// Error types for generation calls
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to read input image {}: {source}", path.display())]
    InputImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {0} seconds")]
    Timeout(u64),
}

/// One unit of the streamed response
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseChunk {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,

    /// Error object the service may emit in place of candidates
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CandidateContent {
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

/// A sub-unit of a chunk: text, inline binary data, or something we don't use
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub inline_data: Option<InlineBlob>,
}

/// Inline binary payload, base64 on the wire
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InlineBlob {
    #[serde(default)]
    pub mime_type: String,

    #[serde(default, with = "base64_bytes")]
    pub data: Vec<u8>,
}

/// `{"error": {"code": .., "message": .., "status": ..}}`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

impl ApiErrorBody {
    pub fn describe(&self) -> String {
        match (&self.status, self.code) {
            (Some(status), Some(code)) => format!("{} ({} {})", self.message, code, status),
            (Some(status), None) => format!("{} ({})", self.message, status),
            (None, Some(code)) => format!("{} ({})", self.message, code),
            (None, None) => self.message.clone(),
        }
    }
}

/// Classification of a response part, decided once per part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind<'a> {
    InlineImage { mime_type: &'a str, data: &'a [u8] },
    Text(&'a str),
    Other,
}

impl ResponseChunk {
    /// Parts of the first candidate, or `None` for heartbeat/empty frames
    pub fn parts(&self) -> Option<&[ResponsePart]> {
        let parts = self
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_deref()?;

        if parts.is_empty() {
            None
        } else {
            Some(parts)
        }
    }
}

impl ResponsePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineBlob {
                mime_type: mime_type.into(),
                data,
            }),
        }
    }

    /// Inline data wins over text when a part carries both
    pub fn kind(&self) -> PartKind<'_> {
        if let Some(blob) = &self.inline_data {
            if !blob.data.is_empty() {
                return PartKind::InlineImage {
                    mime_type: &blob.mime_type,
                    data: &blob.data,
                };
            }
        }

        match self.text.as_deref() {
            Some(text) if !text.is_empty() => PartKind::Text(text),
            _ => PartKind::Other,
        }
    }
}

impl ResponseChunk {
    /// Build a single-candidate chunk from parts
    pub fn from_parts(parts: Vec<ResponsePart>) -> Self {
        Self {
            candidates: Some(vec![Candidate {
                content: Some(CandidateContent {
                    role: Some("model".to_string()),
                    parts: Some(parts),
                }),
                finish_reason: None,
            }]),
            error: None,
        }
    }
}

/// Consolidated outcome of one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub success: bool,
    pub text: String,
    pub files: Vec<PathBuf>,
    pub error: Option<String>,

    /// Saved artifacts backing `files`, in the same order
    pub artifacts: Vec<GeneratedArtifact>,
}

impl GenerationResult {
    pub fn succeeded(text: String, artifacts: Vec<GeneratedArtifact>) -> Self {
        let files = artifacts.iter().map(|a| a.absolute_path.clone()).collect();
        Self {
            success: true,
            text,
            files,
            error: None,
            artifacts,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.is_empty() {
            error = "Unknown error".to_string();
        }
        Self {
            success: false,
            text: String::new(),
            files: Vec::new(),
            error: Some(error),
            artifacts: Vec::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum ResultWire<'a> {
    Success {
        success: bool,
        text: &'a str,
        files: &'a [PathBuf],
    },
    Failure {
        success: bool,
        error: &'a str,
    },
}

impl Serialize for GenerationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match (&self.error, self.success) {
            (None, true) => ResultWire::Success {
                success: true,
                text: &self.text,
                files: &self.files,
            },
            (error, _) => ResultWire::Failure {
                success: false,
                error: error.as_deref().unwrap_or("Unknown error"),
            },
        };
        wire.serialize(serializer)
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.trim()).map_err(serde::de::Error::custom)
    }
}
