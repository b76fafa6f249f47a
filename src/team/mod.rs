//! Team-level insights
//!
//! A [`TeamSummary`](crate::types::TeamSummary) is either supplied by the
//! caller or aggregated from a batch of prediction records, then turned into
//! 0 to 4 insight cards by the generative service or the fallback rules.

pub mod fallback;
pub mod prompt;
pub mod summary;
pub mod synthesizer;

pub use fallback::TeamFallbackRuleEngine;
pub use prompt::build_team_prompt;
pub use summary::summarize_team;
pub use synthesizer::TeamInsightSynthesizer;

/// Maximum insight cards returned for a team
pub const MAX_INSIGHTS: usize = 4;
