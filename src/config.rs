//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::PulseError;
use crate::genai::{GeminiConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::predictor::TOP_FEATURE_COUNT;

/// Service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Directory holding the nine model artifacts
    pub model_dir: PathBuf,

    /// Generative service settings, `None` when no API key is configured
    pub gemini: Option<GeminiConfig>,

    /// Representative features per domain in aggregated team summaries
    pub top_features: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("."),
            gemini: None,
            top_features: TOP_FEATURE_COUNT,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, PulseError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PulseError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini = match var("GEMINI_API_KEY") {
            Some(api_key) => Some(GeminiConfig {
                api_key,
                model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                api_base: var("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                timeout: var("GEMINI_TIMEOUT_SECS")
                    .map(|raw| parse_number::<u64>("GEMINI_TIMEOUT_SECS", &raw))
                    .transpose()?
                    .map(Duration::from_secs),
            }),
            None => None,
        };

        Ok(Self {
            model_dir: var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            gemini,
            top_features: var("PULSE_TOP_FEATURES")
                .map(|raw| parse_number::<usize>("PULSE_TOP_FEATURES", &raw))
                .transpose()?
                .unwrap_or(TOP_FEATURE_COUNT),
        })
    }

    /// Override the artifact directory
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = dir.into();
        self
    }

    /// Disable the generative service
    pub fn without_genai(mut self) -> Self {
        self.gemini = None;
        self
    }

    pub fn genai_enabled(&self) -> bool {
        self.gemini.is_some()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, PulseError> {
    raw.trim()
        .parse()
        .map_err(|_| PulseError::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}
