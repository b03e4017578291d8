//! Artifact filename scheme

use chrono::{DateTime, Local};
use uuid::Uuid;

const PREFIX: &str = "generated_step";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Builds `generated_step_{index}_{timestamp}_{token}` filename bases
///
/// One namer lives for exactly one generation call. The token is drawn once
/// per call so two calls emitting their Nth image in the same second still
/// get different names.
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    call_token: String,
}

impl ArtifactNamer {
    pub fn new() -> Self {
        let token = Uuid::new_v4().simple().to_string();
        Self::with_token(&token[..8])
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            call_token: token.to_string(),
        }
    }

    pub fn call_token(&self) -> &str {
        &self.call_token
    }

    /// Filename base (no extension) for the image at `index`, stamped now
    pub fn base_name(&self, index: usize) -> String {
        self.base_name_at(index, Local::now())
    }

    pub fn base_name_at(&self, index: usize, at: DateTime<Local>) -> String {
        format!(
            "{}_{}_{}_{}",
            PREFIX,
            index,
            at.format(TIMESTAMP_FORMAT),
            self.call_token
        )
    }
}

impl Default for ArtifactNamer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequential index encoded in an artifact filename, if it follows the scheme
pub fn parse_index(filename: &str) -> Option<usize> {
    filename
        .strip_prefix(PREFIX)?
        .strip_prefix('_')?
        .split('_')
        .next()?
        .parse()
        .ok()
}
