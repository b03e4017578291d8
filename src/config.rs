//! Application configuration from JSON

use crate::generation::client::DEFAULT_TIMEOUT_SECS;
use crate::generation::gemini::{GeminiConfig, DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Name of the config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variables checked for the API key, in order
pub const API_KEY_ENV_VARS: &[&str] = &["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API key for the generation service
    pub google_api_key: Option<String>,

    /// Model used for every step
    pub model_name: String,

    /// Scheme and host of the generation API
    pub api_base_url: String,

    /// Where generated artifacts are written
    pub output_dir: PathBuf,

    /// Workflow step definitions
    pub prompts_path: PathBuf,

    /// Deadline for one whole generation call (in seconds)
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            model_name: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            output_dir: PathBuf::from("outputs"),
            prompts_path: PathBuf::from("templates").join("prompts.json"),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults on any problem
    ///
    /// With no explicit path, `./config.json` is tried first, then
    /// `<config dir>/robogen/config.json`.
    pub fn load(explicit: Option<&Path>) -> Self {
        let candidates: Vec<PathBuf> = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => default_locations(),
        };

        let Some(path) = candidates.iter().find(|p| p.exists()) else {
            warn!("{} not found, using default configuration", CONFIG_FILE_NAME);
            return Self::default();
        };

        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Error loading config: {:#}", e);
                Self::default()
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            anyhow::bail!("model_name must not be empty");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            anyhow::bail!("api_base_url must be an http(s) URL: {}", self.api_base_url);
        }
        Ok(())
    }

    /// Fill in the API key from the environment; the environment wins
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = API_KEY_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
        {
            self.google_api_key = Some(key);
        }
        self
    }

    /// API key, ignoring blanks and the placeholder from the sample config
    pub fn api_key(&self) -> Option<&str> {
        self.google_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != "your_google_api_key_here")
    }

    /// Backend configuration for the generation service
    pub fn gemini_config(&self) -> Result<GeminiConfig> {
        let key = self.api_key().with_context(|| {
            format!(
                "No API key configured: set google_api_key in {} or {}",
                CONFIG_FILE_NAME,
                API_KEY_ENV_VARS.join(" / ")
            )
        })?;

        Ok(GeminiConfig::new(key)
            .with_model(&self.model_name)
            .with_base_url(&self.api_base_url))
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("robogen").join(CONFIG_FILE_NAME));
    }
    locations
}
