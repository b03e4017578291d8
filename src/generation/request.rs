//! Outbound request types

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::generation::mime;
use crate::generation::GenerationError;

/// What the caller asks for: a prompt and maybe an image to condition on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub input_image_path: Option<PathBuf>,
}

impl GenerationRequest {
    pub fn new(prompt_text: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            input_image_path: None,
        }
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_image_path = Some(path.into());
        self
    }

    /// Build the wire request, reading the input image if it exists
    ///
    /// A missing image file is not an error; the request goes out text-only.
    pub async fn into_content_request(self) -> Result<ContentRequest, GenerationError> {
        let mut parts = vec![RequestPart::Text {
            text: self.prompt_text,
        }];

        if let Some(path) = self.input_image_path.as_deref() {
            if let Some(part) = read_image_part(path).await? {
                parts.push(part);
            }
        }

        Ok(ContentRequest::new(parts))
    }
}

async fn read_image_part(path: &Path) -> Result<Option<RequestPart>, GenerationError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!("Input image {} not found, sending text only", path.display());
        return Ok(None);
    }

    let data = tokio::fs::read(path)
        .await
        .map_err(|source| GenerationError::InputImage {
            path: path.to_path_buf(),
            source,
        })?;
    let mime_type = mime::mime_type_for_path(path);

    debug!(
        "Attaching input image {} ({}, {} bytes)",
        path.display(),
        mime_type,
        data.len()
    );

    Ok(Some(RequestPart::InlineData {
        inline_data: OutboundBlob {
            mime_type: mime_type.to_string(),
            data,
        },
    }))
}

/// Body of a `streamGenerateContent` call
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequestPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: OutboundBlob,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundBlob {
    pub mime_type: String,
    #[serde(serialize_with = "serialize_base64")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<Modality>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Image,
    Text,
}

impl ContentRequest {
    /// Single user turn asking for both images and text back
    pub fn new(parts: Vec<RequestPart>) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: vec![Modality::Image, Modality::Text],
            },
        }
    }

    pub fn parts(&self) -> &[RequestPart] {
        self.contents
            .first()
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}
