//! Structured content extraction from generative replies
//!
//! Replies may be bare JSON, fenced JSON, or JSON wrapped in prose. Extraction
//! is total: every input yields an [`Extraction`] and nothing here panics or
//! returns an error.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::types::TeamInsight;

/// Outcome of decoding externally sourced JSON
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    /// Parsed and matched the expected shape
    Valid(T),
    /// Parsed as JSON but did not match the expected shape
    ShapeMismatch(String),
    /// No JSON could be parsed
    ParseFailure(String),
}

impl<T> Extraction<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Extraction::Valid(_))
    }

    pub fn valid(self) -> Option<T> {
        match self {
            Extraction::Valid(value) => Some(value),
            _ => None,
        }
    }

    /// Reason for a non-valid outcome
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Extraction::Valid(_) => None,
            Extraction::ShapeMismatch(reason) | Extraction::ParseFailure(reason) => Some(reason),
        }
    }
}

impl<T: Default> Extraction<T> {
    /// The decoded value, or the empty structure
    pub fn unwrap_or_empty(self) -> T {
        self.valid().unwrap_or_default()
    }
}

fn fenced_block() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"```(?:json)?\s*(\{[\s\S]*?\})\s*```").ok())
        .as_ref()
}

fn braced_span() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(\{[\s\S]*\})").ok())
        .as_ref()
}

fn first_capture<'t>(pattern: Option<&Regex>, text: &'t str) -> Option<&'t str> {
    pattern
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Locate and parse the JSON payload of a reply.
///
/// Steps, in order: take the contents of a fenced block when present; if the
/// text still does not start with `{`, take the outermost `{...}` span; parse
/// what remains.
pub fn extract_json(text: &str) -> Extraction<Value> {
    let mut candidate = text.trim();

    if candidate.contains("```") {
        if let Some(inner) = first_capture(fenced_block(), candidate) {
            candidate = inner;
        }
    }

    if !candidate.starts_with('{') {
        if let Some(span) = first_capture(braced_span(), candidate) {
            candidate = span;
        }
    }

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Extraction::Valid(value),
        Err(e) => Extraction::ParseFailure(e.to_string()),
    }
}

/// Individual narrative as returned by the service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeReply {
    pub recommendations: Vec<String>,
    pub explanation: String,
}

/// Render a JSON value as plain text
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decode an individual narrative reply.
///
/// A scalar `recommendations` becomes a one-element list and every entry is
/// rendered as text; `explanation` is rendered as text.
pub fn decode_narrative(value: &Value) -> Extraction<NarrativeReply> {
    let Some(object) = value.as_object() else {
        return Extraction::ShapeMismatch("reply is not a JSON object".to_string());
    };

    let recommendations = match object.get("recommendations") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(value_to_text).collect(),
        Some(scalar) => vec![value_to_text(scalar)],
    };

    let explanation = object
        .get("explanation")
        .map(value_to_text)
        .unwrap_or_default();

    Extraction::Valid(NarrativeReply {
        recommendations: recommendations
            .into_iter()
            .filter(|r| !r.trim().is_empty())
            .collect(),
        explanation,
    })
}

/// Extract and decode an individual narrative from raw reply text
pub fn extract_narrative(text: &str) -> Extraction<NarrativeReply> {
    match extract_json(text) {
        Extraction::Valid(value) => decode_narrative(&value),
        Extraction::ShapeMismatch(reason) => Extraction::ShapeMismatch(reason),
        Extraction::ParseFailure(reason) => Extraction::ParseFailure(reason),
    }
}

/// Pull the raw `insights` items out of a team reply
pub fn extract_insight_items(text: &str) -> Extraction<Vec<Value>> {
    match extract_json(text) {
        Extraction::Valid(Value::Object(mut object)) => match object.remove("insights") {
            Some(Value::Array(items)) => Extraction::Valid(items),
            Some(_) => Extraction::ShapeMismatch("`insights` is not a list".to_string()),
            None => Extraction::ShapeMismatch("missing `insights`".to_string()),
        },
        Extraction::Valid(_) => Extraction::ShapeMismatch("reply is not a JSON object".to_string()),
        Extraction::ShapeMismatch(reason) => Extraction::ShapeMismatch(reason),
        Extraction::ParseFailure(reason) => Extraction::ParseFailure(reason),
    }
}

/// Validate one insight item against the TeamInsight shape
pub fn decode_insight(item: &Value) -> Extraction<TeamInsight> {
    if !item.is_object() {
        return Extraction::ShapeMismatch("insight is not a JSON object".to_string());
    }

    match serde_json::from_value::<TeamInsight>(item.clone()) {
        Ok(insight) => validate_insight(insight),
        Err(e) => Extraction::ShapeMismatch(e.to_string()),
    }
}

/// Reject insights with blank required fields
pub fn validate_insight(insight: TeamInsight) -> Extraction<TeamInsight> {
    if insight.title.trim().is_empty() {
        return Extraction::ShapeMismatch("insight title is empty".to_string());
    }
    if insight.description.trim().is_empty() {
        return Extraction::ShapeMismatch("insight description is empty".to_string());
    }
    Extraction::Valid(insight)
}
