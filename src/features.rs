//! Windowed feature aggregation
//!
//! This module turns an employee's weekly history into the three feature
//! vectors consumed by the classifiers:
//! - Burnout: workload, deadline pressure, meeting load and recovery signals
//! - Performance: completion, trends in engagement, collaboration and learning
//! - Growth: the performance fields plus stretch assignments
//!
//! Only the most recent [`WINDOW_WEEKS`] entries (by `week_start`) take part.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PulseError;
use crate::types::{Domain, EmployeeWindow, WeeklyMetric, WINDOW_WEEKS};

/// Burnout feature names, in construction order
pub const BURNOUT_FEATURES: [&str; 7] = [
    "avg_workload",
    "workload_trend",
    "deadline_miss_rate",
    "meeting_load",
    "engagement_drop",
    "collaboration_drop",
    "recovery_gap",
];

/// Performance feature names, in construction order
pub const PERFORMANCE_FEATURES: [&str; 7] = [
    "task_completion_ratio",
    "workload_trend",
    "deadline_miss_rate",
    "meeting_load",
    "engagement_trend",
    "collaboration_trend",
    "learning_trend",
];

/// Growth feature names, in construction order
pub const GROWTH_FEATURES: [&str; 8] = [
    "task_completion_ratio",
    "workload_trend",
    "deadline_miss_rate",
    "meeting_load",
    "engagement_trend",
    "collaboration_trend",
    "learning_trend",
    "stretch_assignments",
];

/// Feature names for a domain, in construction order
pub fn feature_names(domain: Domain) -> &'static [&'static str] {
    match domain {
        Domain::Burnout => &BURNOUT_FEATURES,
        Domain::Performance => &PERFORMANCE_FEATURES,
        Domain::Growth => &GROWTH_FEATURES,
    }
}

/// Ordered named features for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub domain: Domain,
    values: Vec<f64>,
}

impl FeatureVector {
    fn new(domain: Domain, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), feature_names(domain).len());
        Self { domain, values }
    }

    /// Field names in construction order
    pub fn names(&self) -> &'static [&'static str] {
        feature_names(self.domain)
    }

    /// Field values in construction order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names()
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.values.get(i).copied())
    }

    /// The first `n` field names.
    ///
    /// This is positional, not an importance ranking.
    pub fn leading_names(&self, n: usize) -> Vec<String> {
        self.names().iter().take(n).map(|s| s.to_string()).collect()
    }
}

/// Intermediate aggregates over the 4-week window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAggregates {
    pub tasks_assigned_sum: f64,
    pub tasks_completed_sum: f64,
    pub missed_deadlines_sum: f64,
    pub task_completion_ratio: f64,
    pub deadline_miss_rate: f64,
    pub workload_trend: f64,
    pub engagement_trend: f64,
    pub collaboration_trend: f64,
    pub learning_trend: f64,
    pub engagement_drop: f64,
    pub collaboration_drop: f64,
    pub meeting_load: f64,
    pub avg_workload: f64,
    pub recovery_gap: f64,
    pub stretch_assignments: f64,
}

/// The three feature vectors plus the window bounds they were computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub aggregates: WindowAggregates,
    pub burnout: FeatureVector,
    pub performance: FeatureVector,
    pub growth: FeatureVector,
}

/// Feature aggregator for weekly employee telemetry
pub struct FeatureAggregator;

impl FeatureAggregator {
    /// Compute the feature set for an employee window
    pub fn aggregate(employee: &EmployeeWindow) -> Result<FeatureSet, PulseError> {
        let window = latest_window(employee)?;
        let aggregates = compute_aggregates(&window);

        let burnout = FeatureVector::new(
            Domain::Burnout,
            vec![
                aggregates.avg_workload,
                aggregates.workload_trend,
                aggregates.deadline_miss_rate,
                aggregates.meeting_load,
                aggregates.engagement_drop,
                aggregates.collaboration_drop,
                aggregates.recovery_gap,
            ],
        );

        let performance_values = vec![
            aggregates.task_completion_ratio,
            aggregates.workload_trend,
            aggregates.deadline_miss_rate,
            aggregates.meeting_load,
            aggregates.engagement_trend,
            aggregates.collaboration_trend,
            aggregates.learning_trend,
        ];

        let mut growth_values = performance_values.clone();
        growth_values.push(aggregates.stretch_assignments);

        Ok(FeatureSet {
            window_start: window[0].week_start,
            window_end: window[WINDOW_WEEKS - 1].week_start,
            aggregates,
            burnout,
            performance: FeatureVector::new(Domain::Performance, performance_values),
            growth: FeatureVector::new(Domain::Growth, growth_values),
        })
    }
}

/// Select the most recent weeks, oldest first
pub fn latest_window(employee: &EmployeeWindow) -> Result<Vec<&WeeklyMetric>, PulseError> {
    if employee.weeks.len() < WINDOW_WEEKS {
        return Err(PulseError::InsufficientHistory {
            employee_id: employee.employee_id,
            weeks: employee.weeks.len(),
        });
    }

    let mut sorted: Vec<&WeeklyMetric> = employee.weeks.iter().collect();
    sorted.sort_by_key(|w| w.week_start);

    Ok(sorted.split_off(sorted.len() - WINDOW_WEEKS))
}

fn compute_aggregates(window: &[&WeeklyMetric]) -> WindowAggregates {
    let first = window[0];
    let last = window[window.len() - 1];

    let tasks_assigned_sum = sum_by(window, |w| w.tasks_assigned as f64);
    let tasks_completed_sum = sum_by(window, |w| w.tasks_completed as f64);
    let missed_deadlines_sum = sum_by(window, |w| w.missed_deadlines as f64);

    let meeting_load = mean_by(window, |w| w.meeting_hours);

    WindowAggregates {
        tasks_assigned_sum,
        tasks_completed_sum,
        missed_deadlines_sum,
        task_completion_ratio: guarded_ratio(tasks_completed_sum, tasks_assigned_sum),
        deadline_miss_rate: guarded_ratio(missed_deadlines_sum, tasks_assigned_sum),
        workload_trend: last.tasks_assigned as f64 - first.tasks_assigned as f64,
        engagement_trend: last.engagement_score - first.engagement_score,
        collaboration_trend: last.collaboration_score - first.collaboration_score,
        learning_trend: last.learning_hours - first.learning_hours,
        engagement_drop: (first.engagement_score - last.engagement_score).max(0.0),
        collaboration_drop: (first.collaboration_score - last.collaboration_score).max(0.0),
        meeting_load,
        avg_workload: mean_by(window, |w| w.tasks_assigned as f64),
        recovery_gap: (meeting_load - last.learning_hours).max(0.0),
        stretch_assignments: sum_by(window, |w| w.stretch_assignments as f64),
    }
}

/// Ratio that yields 0.0 whenever the denominator is not positive
fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn sum_by(window: &[&WeeklyMetric], f: impl Fn(&WeeklyMetric) -> f64) -> f64 {
    window.iter().map(|w| f(*w)).sum()
}

fn mean_by(window: &[&WeeklyMetric], f: impl Fn(&WeeklyMetric) -> f64) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    sum_by(window, f) / window.len() as f64
}
