//! Generative-text service client
//!
//! The service takes a free-form prompt and returns free-form text that may
//! contain a JSON object. Every failure is reported as a [`GenerationError`]
//! so callers can branch to their deterministic fallback.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";

/// Default Gemini REST endpoint
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Reasons a generation call produced no usable text
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("service returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("service returned no text")]
    EmptyReply,

    #[error("malformed service response: {0}")]
    MalformedResponse(String),
}

/// Per-call generation settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    /// Ask the service for a JSON-only reply
    pub json_response: bool,
}

impl GenerationOptions {
    /// Settings used for structured JSON replies
    pub fn json(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            json_response: true,
        }
    }
}

/// A generative-text backend
pub trait TextGenerator: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Generate text for a prompt
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, GenerationError>;
}

/// Gemini client settings
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    /// `None` waits for the service indefinitely
    pub timeout: Option<Duration>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: None,
        }
    }
}

/// Blocking Gemini `generateContent` client
pub struct GeminiClient {
    config: GeminiConfig,
    agent: ureq::Agent,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<RequestGenerationConfig>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            config,
            agent: builder.build(),
        }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model.trim_start_matches('/')
        )
    }
}

fn build_request<'a>(prompt: &'a str, options: &GenerationOptions) -> GenerateRequest<'a> {
    let generation_config = if options.temperature.is_some() || options.json_response {
        Some(RequestGenerationConfig {
            temperature: options.temperature,
            response_mime_type: options.json_response.then_some("application/json"),
        })
    } else {
        None
    };

    GenerateRequest {
        contents: vec![RequestContent {
            parts: vec![RequestPart { text: prompt }],
        }],
        generation_config,
    }
}

/// Concatenate the text parts of the first candidate
fn reply_text(body: &str) -> Result<String, GenerationError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(GenerationError::EmptyReply)
    } else {
        Ok(text)
    }
}

impl TextGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, GenerationError> {
        let body = serde_json::to_string(&build_request(prompt, options))
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let response = self
            .agent
            .post(&self.endpoint())
            .query("key", &self.config.api_key)
            .set("Content-Type", "application/json")
            .send_string(&body);

        match response {
            Ok(resp) => {
                let text = resp
                    .into_string()
                    .map_err(|e| GenerationError::Transport(e.to_string()))?;
                reply_text(&text)
            }
            Err(ureq::Error::Status(code, resp)) => Err(GenerationError::Status {
                code,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(GenerationError::Transport(e.to_string())),
        }
    }
}
