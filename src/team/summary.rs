//! Aggregate prediction records into a team summary

use std::collections::HashMap;

use crate::types::{PredictionRecord, TeamSummary};

pub const HIGH_BURNOUT_LABEL: &str = "High";
pub const DECLINING_PERFORMANCE_LABEL: &str = "Declining";
pub const HIGH_POTENTIAL_LABEL: &str = "High-Potential";

/// Build a team summary from one batch of records.
///
/// Each representative feature list holds the features most often reported
/// for the flagged employees of that domain, ties broken by first appearance.
pub fn summarize_team(records: &[PredictionRecord], top_n: usize) -> TeamSummary {
    let high_burnout: Vec<&PredictionRecord> = records
        .iter()
        .filter(|r| r.burnout_risk == HIGH_BURNOUT_LABEL)
        .collect();
    let declining: Vec<&PredictionRecord> = records
        .iter()
        .filter(|r| r.performance_trend == DECLINING_PERFORMANCE_LABEL)
        .collect();
    let high_potential: Vec<&PredictionRecord> = records
        .iter()
        .filter(|r| r.growth_potential == HIGH_POTENTIAL_LABEL)
        .collect();

    TeamSummary {
        total_employees: count(records.len()),
        high_burnout_count: count(high_burnout.len()),
        declining_performance_count: count(declining.len()),
        high_potential_count: count(high_potential.len()),
        top_burnout_features: most_frequent(
            high_burnout.iter().map(|r| &r.burnout_top_features),
            top_n,
        ),
        top_performance_features: most_frequent(
            declining.iter().map(|r| &r.performance_top_features),
            top_n,
        ),
        top_growth_features: most_frequent(
            high_potential.iter().map(|r| &r.growth_top_features),
            top_n,
        ),
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Rank names by frequency, ties by first appearance
fn most_frequent<'a>(lists: impl Iterator<Item = &'a Vec<String>>, top_n: usize) -> Vec<String> {
    // name -> (count, first seen)
    let mut tally: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut order = 0;

    for name in lists.flatten() {
        let entry = tally.entry(name.as_str()).or_insert((0, order));
        entry.0 += 1;
        order += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = tally.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(name, _)| name.to_string())
        .collect()
}
