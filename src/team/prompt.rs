//! Prompt for team insights

use crate::types::TeamSummary;

/// Build the team insights prompt around the pretty-printed summary
pub fn build_team_prompt(summary: &TeamSummary) -> String {
    let summary_json = serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"
You are an AI insights analyst for a people analytics dashboard.
Team summary:
{summary_json}

Return JSON ONLY with this shape:
{{
  "insights": [
    {{
      "title": "...",
      "description": "...",
      "type": "team_shift|pattern|alert_summary",
      "level": "team"
    }}
  ]
}}

Rules:
- Provide 2 to 4 insights.
- Keep each description under 2 sentences.
- Focus on aggregated signals, not individual surveillance.
"#
    )
}
