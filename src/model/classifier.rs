//! Classifier seam
//!
//! Production classifiers are ONNX sessions (see [`crate::model::onnx`]). The
//! orchestrator only relies on this trait: a fixed input width, a fixed class
//! count, and a class index plus probability distribution per row.

use std::fmt;

use crate::error::PulseError;

/// Output of one classification
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    /// Encoded class index, decoded through the label encoder
    pub class: usize,
    /// Per-class probabilities in encoder order
    pub probabilities: Vec<f64>,
}

/// A pre-trained probabilistic classifier
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Expected width of a scaled feature row
    fn n_features(&self) -> usize;

    /// Number of classes in the probability output
    fn n_classes(&self) -> usize;

    /// Classify one scaled feature row
    fn predict(&self, row: &[f32]) -> Result<ClassScores, PulseError>;
}
