//! Core data types for Pulse Insights
//!
//! This module defines the value objects that flow through the prediction and
//! insight pipelines. All of them are constructed per request and never
//! outlive it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Number of weekly entries that make up a scoring window
pub const WINDOW_WEEKS: usize = 4;

/// Prediction axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Burnout,
    Performance,
    Growth,
}

impl Domain {
    /// All domains in scoring order
    pub const ALL: [Domain; 3] = [Domain::Burnout, Domain::Performance, Domain::Growth];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Burnout => "burnout",
            Domain::Performance => "performance",
            Domain::Growth => "growth",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One week of raw telemetry for a contributor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMetric {
    /// Start of the reporting week
    #[serde(deserialize_with = "deserialize_week_start")]
    pub week_start: DateTime<Utc>,
    pub tasks_assigned: u32,
    pub tasks_completed: u32,
    pub missed_deadlines: u32,
    /// Meeting time in hours
    pub meeting_hours: f64,
    pub collaboration_score: f64,
    pub engagement_score: f64,
    /// Learning time in hours
    pub learning_hours: f64,
    pub stretch_assignments: u32,
}

/// Weekly history for one employee, in arbitrary order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeWindow {
    pub employee_id: i64,
    pub weeks: Vec<WeeklyMetric>,
}

/// Per-employee result returned by `predict_batch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub employee_id: i64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub burnout_risk: String,
    pub burnout_confidence: f64,
    pub burnout_top_features: Vec<String>,
    pub performance_trend: String,
    pub performance_confidence: f64,
    pub performance_top_features: Vec<String>,
    pub growth_potential: String,
    pub growth_confidence: f64,
    pub growth_top_features: Vec<String>,
    pub recommendations: Vec<String>,
    pub explanation: String,
}

/// Batch prediction request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchPredictRequest {
    pub employees: Vec<EmployeeWindow>,
}

/// Batch prediction response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictResponse {
    pub results: Vec<PredictionRecord>,
}

/// Aggregated team signals used for team-level insights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub total_employees: u32,
    pub high_burnout_count: u32,
    pub declining_performance_count: u32,
    pub high_potential_count: u32,
    #[serde(default)]
    pub top_burnout_features: Vec<String>,
    #[serde(default)]
    pub top_performance_features: Vec<String>,
    #[serde(default)]
    pub top_growth_features: Vec<String>,
}

/// Kind of team insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    #[default]
    TeamShift,
    Pattern,
    AlertSummary,
}

impl InsightType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "team_shift" => Some(InsightType::TeamShift),
            "pattern" => Some(InsightType::Pattern),
            "alert_summary" => Some(InsightType::AlertSummary),
            _ => None,
        }
    }
}

/// Scope of an insight (only team-level insights exist)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightLevel {
    #[default]
    Team,
}

/// A team-level insight card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInsight {
    pub title: String,
    pub description: String,
    /// Unknown or non-string values read as `team_shift`
    #[serde(rename = "type", default, deserialize_with = "deserialize_insight_type")]
    pub insight_type: InsightType,
    /// Always `team`, whatever the source says
    #[serde(default, deserialize_with = "deserialize_insight_level")]
    pub level: InsightLevel,
}

impl TeamInsight {
    pub fn new(title: impl Into<String>, description: impl Into<String>, insight_type: InsightType) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            insight_type,
            level: InsightLevel::Team,
        }
    }
}

/// Team insights response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamInsightsResponse {
    pub insights: Vec<TeamInsight>,
}

/// Liveness response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

fn deserialize_insight_type<'de, D>(deserializer: D) -> Result<InsightType, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(InsightType::parse).unwrap_or_default())
}

fn deserialize_insight_level<'de, D>(deserializer: D) -> Result<InsightLevel, D::Error>
where
    D: Deserializer<'de>,
{
    IgnoredAny::deserialize(deserializer)?;
    Ok(InsightLevel::Team)
}

fn deserialize_week_start<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_week_start(&raw).map_err(serde::de::Error::custom)
}

/// Parse a week start timestamp.
///
/// Accepts RFC 3339, naive date-times (read as UTC) and plain dates.
pub fn parse_week_start(raw: &str) -> Result<DateTime<Utc>, String> {
    let value = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(format!("Unrecognised week_start timestamp: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_week_start_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();

        assert_eq!(parse_week_start("2024-01-15T00:00:00Z").unwrap(), expected);
        assert_eq!(parse_week_start("2024-01-15T02:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_week_start("2024-01-15T00:00:00").unwrap(), expected);
        assert_eq!(parse_week_start("2024-01-15T00:00:00.000").unwrap(), expected);
        assert_eq!(parse_week_start("2024-01-15").unwrap(), expected);
        assert!(parse_week_start("last monday").is_err());
    }

    #[test]
    fn test_weekly_metric_deserialization() {
        let json = r#"{
            "week_start": "2024-01-15",
            "tasks_assigned": 10,
            "tasks_completed": 8,
            "missed_deadlines": 1,
            "meeting_hours": 12.5,
            "collaboration_score": 0.7,
            "engagement_score": 0.8,
            "learning_hours": 2.0,
            "stretch_assignments": 1
        }"#;

        let metric: WeeklyMetric = serde_json::from_str(json).unwrap();
        assert_eq!(metric.tasks_assigned, 10);
        assert_eq!(metric.meeting_hours, 12.5);
        assert_eq!(metric.week_start, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_team_insight_serialization() {
        let insight = TeamInsight::new("Growth Momentum", "Two employees.", InsightType::AlertSummary);
        let value = serde_json::to_value(&insight).unwrap();

        assert_eq!(value["type"], "alert_summary");
        assert_eq!(value["level"], "team");
    }

    #[test]
    fn test_team_insight_defaults() {
        let insight: TeamInsight =
            serde_json::from_str(r#"{"title": "t", "description": "d"}"#).unwrap();
        assert_eq!(insight.insight_type, InsightType::TeamShift);
        assert_eq!(insight.level, InsightLevel::Team);
    }

    #[test]
    fn test_team_summary_optional_feature_lists() {
        let json = r#"{
            "total_employees": 10,
            "high_burnout_count": 3,
            "declining_performance_count": 0,
            "high_potential_count": 0
        }"#;

        let summary: TeamSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.total_employees, 10);
        assert!(summary.top_burnout_features.is_empty());
    }
}
