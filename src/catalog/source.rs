//! Declarative step source (JSON or YAML)

use crate::catalog::{CatalogError, WorkflowStep};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// File format of a step source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// `.yaml`/`.yml` are YAML, everything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => SourceFormat::Yaml,
            _ => SourceFormat::Json,
        }
    }
}

/// Step definition as written in the source file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StepEntry {
    pub title: String,
    pub description: String,
    pub prompt: String,
}

impl StepEntry {
    pub fn into_step(self, index: u32) -> WorkflowStep {
        WorkflowStep {
            index,
            title: self.title,
            description: self.description,
            prompt_template: self.prompt,
        }
    }
}

pub(crate) fn parse_entries(
    content: &str,
    format: SourceFormat,
) -> Result<BTreeMap<String, StepEntry>, CatalogError> {
    match format {
        SourceFormat::Json => {
            serde_json::from_str(content).map_err(|e| CatalogError::Malformed(e.to_string()))
        }
        SourceFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| CatalogError::Malformed(e.to_string()))
        }
    }
}

fn step_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^step_(\d+)$").expect("step key regex is valid"))
}

/// `step_7` -> 7
///
/// The whole key must match; `step_1_extra` is rejected rather than read
/// as step 1.
pub fn parse_step_key(key: &str) -> Result<u32, CatalogError> {
    step_key_regex()
        .captures(key.trim())
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .filter(|index| *index >= 1)
        .ok_or_else(|| CatalogError::InvalidKey(key.to_string()))
}
