//! Deterministic team insight rules

use crate::team::MAX_INSIGHTS;
use crate::types::{InsightType, TeamInsight, TeamSummary};

/// Rule-based team insights, in a fixed order
pub struct TeamFallbackRuleEngine;

impl TeamFallbackRuleEngine {
    pub fn insights(summary: &TeamSummary) -> Vec<TeamInsight> {
        let total = summary.total_employees;
        let mut insights = Vec::new();

        if total > 0 && summary.high_burnout_count > 0 {
            let focus = focus(&summary.top_burnout_features, "workload signals");
            insights.push(TeamInsight::new(
                "Workload Pressure Signals",
                format!(
                    "{} of {} employees show elevated burnout risk driven by {}.",
                    summary.high_burnout_count, total, focus
                ),
                InsightType::TeamShift,
            ));
        }

        if total > 0 && summary.declining_performance_count > 0 {
            let focus = focus(&summary.top_performance_features, "completion trends");
            insights.push(TeamInsight::new(
                "Performance Drag Emerging",
                format!(
                    "{} employees show declining performance linked to {}.",
                    summary.declining_performance_count, focus
                ),
                InsightType::Pattern,
            ));
        }

        if total > 0 && summary.high_potential_count > 0 {
            let focus = focus(&summary.top_growth_features, "learning signals");
            insights.push(TeamInsight::new(
                "Growth Momentum",
                format!(
                    "{} employees show high growth potential tied to {}.",
                    summary.high_potential_count, focus
                ),
                InsightType::AlertSummary,
            ));
        }

        if insights.is_empty() {
            insights.push(TeamInsight::new(
                "Stable Team Signals",
                "No major shifts detected in the latest 4-week window.",
                InsightType::TeamShift,
            ));
        }

        insights.truncate(MAX_INSIGHTS);
        insights
    }
}

/// First two feature names, or a generic phrase
fn focus(features: &[String], default: &str) -> String {
    if features.is_empty() {
        default.to_string()
    } else {
        features.iter().take(2).cloned().collect::<Vec<_>>().join(", ")
    }
}
