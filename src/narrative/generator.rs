//! Narrative generation with deterministic fallback

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::extract::extract_narrative;
use crate::genai::{GenerationOptions, TextGenerator};
use crate::narrative::fallback::{bound_recommendations, FallbackRuleEngine};
use crate::narrative::prompt::build_prompt;
use crate::predictor::EmployeePredictions;

/// Where a narrative came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    Fallback,
}

/// Recommendations and explanation for one employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub recommendations: Vec<String>,
    pub explanation: String,
    pub source: NarrativeSource,
}

impl Narrative {
    fn fallback(predictions: &EmployeePredictions) -> Self {
        let (recommendations, explanation) = FallbackRuleEngine::recommend(predictions);
        Self {
            recommendations,
            explanation,
            source: NarrativeSource::Fallback,
        }
    }
}

/// Produces narratives from the generative service, falling back to rules
#[derive(Clone, Default)]
pub struct NarrativeGenerator {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl NarrativeGenerator {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Generator that always uses the fallback rules
    pub fn rules_only() -> Self {
        Self { generator: None }
    }

    pub fn is_generative(&self) -> bool {
        self.generator.is_some()
    }

    /// Build the narrative for one employee. Never fails.
    pub fn generate(&self, employee_id: i64, predictions: &EmployeePredictions) -> Narrative {
        let Some(generator) = &self.generator else {
            return Narrative::fallback(predictions);
        };

        let prompt = build_prompt(employee_id, predictions);
        let text = match generator.generate(&prompt, &GenerationOptions::default()) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    employee_id,
                    backend = generator.name(),
                    error = %e,
                    "generative call failed, using fallback rules"
                );
                return Narrative::fallback(predictions);
            }
        };

        let extraction = extract_narrative(&text);
        if let Some(reason) = extraction.failure_reason() {
            tracing::debug!(employee_id, reason, "unusable narrative reply");
        }

        let reply = extraction.unwrap_or_empty();
        if reply.recommendations.is_empty() {
            tracing::debug!(employee_id, "reply carried no recommendations, using fallback rules");
            return Narrative::fallback(predictions);
        }

        Narrative {
            recommendations: bound_recommendations(reply.recommendations),
            explanation: reply.explanation,
            source: NarrativeSource::Generated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genai::tests::ScriptedGenerator;
    use crate::genai::GenerationError;
    use crate::narrative::fallback::{
        CHECK_IN_RECOMMENDATION, GENERIC_EXPLANATION, LEARNING_RECOMMENDATION,
    };
    use crate::predictor::DomainPrediction;
    use pretty_assertions::assert_eq;

    fn quiet_predictions() -> EmployeePredictions {
        let p = |label: &str| DomainPrediction {
            label: label.to_string(),
            confidence: 0.7,
            top_features: vec!["avg_workload".to_string()],
        };
        EmployeePredictions {
            burnout: p("Low"),
            performance: p("Stable"),
            growth: p("Low-Potential"),
        }
    }

    fn with(generator: ScriptedGenerator) -> (NarrativeGenerator, Arc<ScriptedGenerator>) {
        let generator = Arc::new(generator);
        (NarrativeGenerator::new(Some(generator.clone())), generator)
    }

    #[test]
    fn test_no_service_uses_rules() {
        let narrative = NarrativeGenerator::rules_only().generate(1, &quiet_predictions());

        assert_eq!(narrative.source, NarrativeSource::Fallback);
        assert_eq!(
            narrative.recommendations,
            vec![LEARNING_RECOMMENDATION, CHECK_IN_RECOMMENDATION]
        );
        assert_eq!(narrative.explanation, GENERIC_EXPLANATION);
    }

    #[test]
    fn test_generated_reply_is_used() {
        let (narrative_gen, service) = with(ScriptedGenerator::replying(
            "```json\n{\"recommendations\": [\"Protect Friday focus time\", \"Pair on the backlog\"], \"explanation\": \"Load is rising.\"}\n```",
        ));
        let narrative = narrative_gen.generate(7, &quiet_predictions());

        assert_eq!(narrative.source, NarrativeSource::Generated);
        assert_eq!(
            narrative.recommendations,
            vec!["Protect Friday focus time", "Pair on the backlog"]
        );
        assert_eq!(narrative.explanation, "Load is rising.");

        let prompts = service.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("Employee 7"));
        assert!(!prompts[0].1.json_response);
    }

    #[test]
    fn test_generated_reply_is_bounded() {
        let (narrative_gen, _) = with(ScriptedGenerator::replying(
            r#"{"recommendations": ["a", "b", "c", "d", "e"], "explanation": "x"}"#,
        ));
        let narrative = narrative_gen.generate(1, &quiet_predictions());
        assert_eq!(narrative.recommendations, vec!["a", "b", "c", "d"]);

        let (narrative_gen, _) = with(ScriptedGenerator::replying(
            r#"{"recommendations": "Take a day off", "explanation": "x"}"#,
        ));
        let narrative = narrative_gen.generate(1, &quiet_predictions());
        assert_eq!(
            narrative.recommendations,
            vec!["Take a day off", CHECK_IN_RECOMMENDATION]
        );
    }

    #[test]
    fn test_empty_reply_falls_back() {
        let (narrative_gen, _) = with(ScriptedGenerator::replying(
            r#"{"recommendations": [], "explanation": "nothing to add"}"#,
        ));
        let narrative = narrative_gen.generate(1, &quiet_predictions());

        assert_eq!(narrative.source, NarrativeSource::Fallback);
        assert_eq!(narrative.explanation, GENERIC_EXPLANATION);
    }

    #[test]
    fn test_garbage_reply_falls_back() {
        let (narrative_gen, _) = with(ScriptedGenerator::replying("I cannot help with that."));
        let narrative = narrative_gen.generate(1, &quiet_predictions());
        assert_eq!(narrative.source, NarrativeSource::Fallback);
    }

    #[test]
    fn test_service_error_falls_back() {
        let (narrative_gen, _) = with(ScriptedGenerator::failing(GenerationError::Status {
            code: 503,
            body: "overloaded".to_string(),
        }));
        let narrative = narrative_gen.generate(1, &quiet_predictions());

        assert_eq!(narrative.source, NarrativeSource::Fallback);
        assert_eq!(narrative.recommendations.len(), 2);
    }
}
