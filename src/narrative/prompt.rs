//! Prompt for individual recommendations

use crate::predictor::{DomainPrediction, EmployeePredictions};

fn signal_line(name: &str, prediction: &DomainPrediction) -> String {
    format!(
        "- {}: {} (top features: {})",
        name,
        prediction.label,
        prediction.top_features.join(", ")
    )
}

/// Build the recommendation prompt for one employee
pub fn build_prompt(employee_id: i64, predictions: &EmployeePredictions) -> String {
    format!(
        r#"
You are an AI manager assistant.
Employee {employee_id} has the following signals:

{burnout}
{performance}
{growth}

Return JSON ONLY with the following shape:
{{
  "recommendations": ["...", "..."],
  "explanation": "..."
}}

Use concise, human-friendly language. Emphasize aggregated signals, no surveillance.
"#,
        burnout = signal_line("Burnout Risk", &predictions.burnout),
        performance = signal_line("Performance Trend", &predictions.performance),
        growth = signal_line("Growth Potential", &predictions.growth),
    )
}
