//! Deterministic recommendation rules
//!
//! Used whenever the generative service is absent or its reply carries no
//! recommendations. Output always holds between 2 and 4 recommendations.

use crate::predictor::EmployeePredictions;

/// Maximum recommendations kept per employee
pub const MAX_RECOMMENDATIONS: usize = 4;

/// Minimum recommendations returned per employee
pub const MIN_RECOMMENDATIONS: usize = 2;

pub const WORKLOAD_RECOMMENDATION: &str =
    "Review workload and meeting load to protect focus time for the next sprint.";
pub const BLOCKER_RECOMMENDATION: &str =
    "Identify blockers and clarify top priorities to stabilize performance.";
pub const REINFORCE_RECOMMENDATION: &str =
    "Reinforce what is working and share best practices with the team.";
pub const STRETCH_RECOMMENDATION: &str =
    "Offer a stretch assignment or mentorship to sustain growth momentum.";
pub const LEARNING_RECOMMENDATION: &str =
    "Allocate dedicated learning time to build longer-term growth signals.";
pub const CHECK_IN_RECOMMENDATION: &str =
    "Schedule a check-in focused on workload balance and priorities.";

/// Explanation used when no rule contributed a fragment
pub const GENERIC_EXPLANATION: &str = "Recommendations based on aggregated 4-week signals.";

/// Rule-based recommendations and explanation
pub struct FallbackRuleEngine;

impl FallbackRuleEngine {
    /// Apply the rules to a set of predictions
    pub fn recommend(predictions: &EmployeePredictions) -> (Vec<String>, String) {
        let burnout = predictions.burnout.label.as_str();
        let performance = predictions.performance.label.as_str();
        let growth = predictions.growth.label.as_str();

        let mut recommendations: Vec<String> = Vec::new();
        let mut fragments: Vec<String> = Vec::new();

        if matches!(burnout, "High" | "Medium") {
            recommendations.push(WORKLOAD_RECOMMENDATION.to_string());
            fragments.push(format!("Burnout risk is {burnout}."));
        }

        match performance {
            "Declining" => {
                recommendations.push(BLOCKER_RECOMMENDATION.to_string());
                fragments.push("Performance trend is declining.".to_string());
            }
            "Improving" => recommendations.push(REINFORCE_RECOMMENDATION.to_string()),
            _ => {}
        }

        if matches!(growth, "High-Potential" | "Medium-Potential") {
            recommendations.push(STRETCH_RECOMMENDATION.to_string());
            fragments.push(format!("Growth potential is {growth}."));
        } else {
            recommendations.push(LEARNING_RECOMMENDATION.to_string());
        }

        let recommendations = bound_recommendations(recommendations);

        let explanation = if fragments.is_empty() {
            GENERIC_EXPLANATION.to_string()
        } else {
            fragments.join(" ")
        };

        (recommendations, explanation)
    }
}

/// Truncate to the maximum and pad with a check-in up to the minimum
pub fn bound_recommendations(mut recommendations: Vec<String>) -> Vec<String> {
    recommendations.truncate(MAX_RECOMMENDATIONS);
    if recommendations.len() < MIN_RECOMMENDATIONS {
        recommendations.push(CHECK_IN_RECOMMENDATION.to_string());
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::DomainPrediction;
    use pretty_assertions::assert_eq;

    fn predictions(burnout: &str, performance: &str, growth: &str) -> EmployeePredictions {
        let p = |label: &str| DomainPrediction {
            label: label.to_string(),
            confidence: 0.9,
            top_features: vec![],
        };
        EmployeePredictions {
            burnout: p(burnout),
            performance: p(performance),
            growth: p(growth),
        }
    }

    #[test]
    fn test_all_rules_fire() {
        let (recs, explanation) =
            FallbackRuleEngine::recommend(&predictions("High", "Declining", "High-Potential"));

        assert_eq!(
            recs,
            vec![
                WORKLOAD_RECOMMENDATION,
                BLOCKER_RECOMMENDATION,
                STRETCH_RECOMMENDATION
            ]
        );
        assert_eq!(
            explanation,
            "Burnout risk is High. Performance trend is declining. Growth potential is High-Potential."
        );
    }

    #[test]
    fn test_quiet_signals_use_generic_explanation() {
        let (recs, explanation) =
            FallbackRuleEngine::recommend(&predictions("Low", "Stable", "Low-Potential"));

        assert_eq!(recs, vec![LEARNING_RECOMMENDATION, CHECK_IN_RECOMMENDATION]);
        assert_eq!(explanation, GENERIC_EXPLANATION);
    }

    #[test]
    fn test_improving_adds_no_fragment() {
        let (recs, explanation) =
            FallbackRuleEngine::recommend(&predictions("Medium", "Improving", "Low-Potential"));

        assert_eq!(
            recs,
            vec![
                WORKLOAD_RECOMMENDATION,
                REINFORCE_RECOMMENDATION,
                LEARNING_RECOMMENDATION
            ]
        );
        assert_eq!(explanation, "Burnout risk is Medium.");
    }

    #[test]
    fn test_cardinality_bounds_for_all_label_combinations() {
        let burnout = ["High", "Medium", "Low", "Unknown"];
        let performance = ["Declining", "Improving", "Stable", "Unknown"];
        let growth = ["High-Potential", "Medium-Potential", "Low-Potential", "Unknown"];

        for b in burnout {
            for p in performance {
                for g in growth {
                    let (recs, explanation) = FallbackRuleEngine::recommend(&predictions(b, p, g));
                    assert!(
                        (MIN_RECOMMENDATIONS..=MAX_RECOMMENDATIONS).contains(&recs.len()),
                        "{b}/{p}/{g} produced {} recommendations",
                        recs.len()
                    );
                    assert!(!explanation.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_bound_recommendations() {
        let many: Vec<String> = (0..6).map(|i| format!("r{i}")).collect();
        assert_eq!(bound_recommendations(many), vec!["r0", "r1", "r2", "r3"]);

        assert_eq!(
            bound_recommendations(vec!["only".to_string()]),
            vec!["only", CHECK_IN_RECOMMENDATION]
        );
    }
}
