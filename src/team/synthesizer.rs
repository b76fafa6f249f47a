//! Team insight synthesis with deterministic fallback

use serde_json::Value;
use std::sync::Arc;

use crate::extract::{decode_insight, extract_insight_items, Extraction};
use crate::genai::{GenerationOptions, TextGenerator};
use crate::team::fallback::TeamFallbackRuleEngine;
use crate::team::prompt::build_team_prompt;
use crate::team::MAX_INSIGHTS;
use crate::types::{TeamInsight, TeamSummary};

/// Sampling temperature for team insight replies
pub const TEAM_TEMPERATURE: f32 = 0.4;

/// Produces team insights from the generative service, falling back to rules
#[derive(Clone, Default)]
pub struct TeamInsightSynthesizer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl TeamInsightSynthesizer {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Build 0 to 4 insights. Never fails.
    ///
    /// Fallback rules run when the reply has no non-empty `insights` list.
    /// Items of a non-empty list are validated one by one and invalid ones
    /// are dropped, so a list of only invalid items yields no insights.
    pub fn synthesize(&self, summary: &TeamSummary) -> Vec<TeamInsight> {
        let items = match self.request_items(summary) {
            Some(items) if !items.is_empty() => items,
            _ => {
                tracing::debug!("no usable team insights from service, using fallback rules");
                return TeamFallbackRuleEngine::insights(summary);
            }
        };

        let total = items.len();
        let insights: Vec<TeamInsight> = items
            .iter()
            .filter_map(|item| match decode_insight(item) {
                Extraction::Valid(insight) => Some(insight),
                other => {
                    tracing::debug!(reason = other.failure_reason(), "dropping invalid insight");
                    None
                }
            })
            .take(MAX_INSIGHTS)
            .collect();

        if insights.len() < total.min(MAX_INSIGHTS) {
            tracing::warn!(
                received = total,
                kept = insights.len(),
                "service returned invalid team insights"
            );
        }

        insights
    }

    fn request_items(&self, summary: &TeamSummary) -> Option<Vec<Value>> {
        let generator = self.generator.as_ref()?;
        let prompt = build_team_prompt(summary);

        let text = match generator.generate(&prompt, &GenerationOptions::json(TEAM_TEMPERATURE)) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(backend = generator.name(), error = %e, "team insight call failed");
                return None;
            }
        };

        let extraction = extract_insight_items(&text);
        if let Some(reason) = extraction.failure_reason() {
            tracing::debug!(reason, "unusable team insight reply");
        }
        extraction.valid()
    }
}
