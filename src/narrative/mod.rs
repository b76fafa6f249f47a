//! Individual narrative generation
//!
//! Pipeline: predictions → prompt → generative service → extraction →
//! (fallback rules when the reply is missing or unusable) → narrative.

pub mod fallback;
pub mod generator;
pub mod prompt;

pub use fallback::FallbackRuleEngine;
pub use generator::{Narrative, NarrativeGenerator, NarrativeSource};
pub use prompt::build_prompt;
