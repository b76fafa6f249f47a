//! Prediction orchestration
//!
//! Scores each domain's feature vector against its scaler, classifier and
//! label decoder.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::PulseError;
use crate::features::{FeatureSet, FeatureVector};
use crate::model::{ArtifactKind, DomainModel, ModelArtifacts};
use crate::types::Domain;

/// Number of feature names reported per domain
pub const TOP_FEATURE_COUNT: usize = 3;

/// Result of scoring one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainPrediction {
    pub label: String,
    /// Maximum class probability, within [0, 1]
    pub confidence: f64,
    /// Leading feature names of the domain's vector (positional, not ranked)
    pub top_features: Vec<String>,
}

/// Predictions for all three domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePredictions {
    pub burnout: DomainPrediction,
    pub performance: DomainPrediction,
    pub growth: DomainPrediction,
}

impl EmployeePredictions {
    pub fn domain(&self, domain: Domain) -> &DomainPrediction {
        match domain {
            Domain::Burnout => &self.burnout,
            Domain::Performance => &self.performance,
            Domain::Growth => &self.growth,
        }
    }
}

/// Scores feature sets against shared, read-only artifacts
#[derive(Debug, Clone)]
pub struct PredictionOrchestrator {
    artifacts: Arc<ModelArtifacts>,
}

impl PredictionOrchestrator {
    pub fn new(artifacts: Arc<ModelArtifacts>) -> Self {
        Self { artifacts }
    }

    /// Score all three domains
    pub fn predict(&self, features: &FeatureSet) -> Result<EmployeePredictions, PulseError> {
        Ok(EmployeePredictions {
            burnout: score_domain(&self.artifacts.burnout, &features.burnout)?,
            performance: score_domain(&self.artifacts.performance, &features.performance)?,
            growth: score_domain(&self.artifacts.growth, &features.growth)?,
        })
    }
}

/// Scale, classify and decode one feature vector
pub fn score_domain(model: &DomainModel, features: &FeatureVector) -> Result<DomainPrediction, PulseError> {
    let scaled = model.scaler.transform(features.values())?;
    let scores = model.classifier.predict(&scaled)?;

    let label = model
        .labels
        .inverse_transform(scores.class)
        .ok_or_else(|| {
            PulseError::invalid_artifact(
                ArtifactKind::LabelEncoder.file_name(model.domain),
                format!("no label for class index {}", scores.class),
            )
        })?
        .to_string();

    Ok(DomainPrediction {
        label,
        confidence: confidence(&scores.probabilities),
        top_features: features.leading_names(TOP_FEATURE_COUNT),
    })
}

/// Maximum probability, clamped to [0, 1]
fn confidence(proba: &[f64]) -> f64 {
    let max = proba
        .iter()
        .copied()
        .filter(|p| p.is_finite())
        .fold(0.0, f64::max);
    max.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::{employee, week};
    use crate::features::FeatureAggregator;
    use crate::model::artifacts::tests::constant_artifacts;
    use crate::model::classifier::tests::SplitClassifier;
    use crate::model::onnx::tests::linear_model_bytes;
    use crate::model::{LabelEncoder, OnnxClassifier, StandardScaler};
    use pretty_assertions::assert_eq;

    fn sample_features() -> FeatureSet {
        let weeks = (0..4).map(|i| week(i, 10, 8, 1)).collect();
        FeatureAggregator::aggregate(&employee(11, weeks)).unwrap()
    }

    #[test]
    fn test_predict_labels_and_confidence() {
        let orchestrator = PredictionOrchestrator::new(Arc::new(constant_artifacts(
            "High",
            "Declining",
            "High-Potential",
        )));
        let predictions = orchestrator.predict(&sample_features()).unwrap();

        assert_eq!(predictions.burnout.label, "High");
        assert_eq!(predictions.performance.label, "Declining");
        assert_eq!(predictions.growth.label, "High-Potential");

        for domain in Domain::ALL {
            let c = predictions.domain(domain).confidence;
            assert!((c - 0.7).abs() < 1e-12);
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn test_top_features_are_positional() {
        // The classifier only looks at the last burnout feature, yet the
        // reported top features stay the first three fields of the vector.
        let n = 7;
        let split = SplitClassifier {
            n_features: n,
            feature: 6,
            threshold: 0.5,
        };
        let mut artifacts = constant_artifacts("Low", "Stable", "Low-Potential");
        artifacts.burnout = DomainModel::new(
            Domain::Burnout,
            StandardScaler::identity(n),
            Arc::new(split),
            LabelEncoder::new(["Low", "High"]),
        )
        .unwrap();

        let orchestrator = PredictionOrchestrator::new(Arc::new(artifacts));
        let predictions = orchestrator.predict(&sample_features()).unwrap();

        // recovery_gap is positive for the sample window
        assert_eq!(predictions.burnout.label, "High");
        assert_eq!(predictions.burnout.confidence, 1.0);
        assert_eq!(
            predictions.burnout.top_features,
            vec!["avg_workload", "workload_trend", "deadline_miss_rate"]
        );
        assert_eq!(
            predictions.performance.top_features,
            vec!["task_completion_ratio", "workload_trend", "deadline_miss_rate"]
        );
        assert_eq!(
            predictions.growth.top_features,
            predictions.performance.top_features
        );
    }

    #[test]
    fn test_score_domain_through_onnx_session() {
        let n = 7;
        let mut coef = vec![vec![0.0; n], vec![0.0; n]];
        coef[1][6] = 1.0;
        let classifier = OnnxClassifier::from_bytes(
            &linear_model_bytes(&coef, &[0.0, 0.0]),
            "burnout_model.onnx",
            n,
        )
        .unwrap();
        let model = DomainModel::new(
            Domain::Burnout,
            StandardScaler::identity(n),
            Arc::new(classifier),
            LabelEncoder::new(["Low", "High"]),
        )
        .unwrap();

        let features = sample_features();
        let prediction = score_domain(&model, &features.burnout).unwrap();

        let gap = features.aggregates.recovery_gap;
        let expected = 1.0 / (1.0 + (-gap).exp());
        assert_eq!(prediction.label, "High");
        assert!((prediction.confidence - expected).abs() < 1e-5);
        assert_eq!(
            prediction.top_features,
            vec!["avg_workload", "workload_trend", "deadline_miss_rate"]
        );
    }

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(confidence(&[0.2, 0.7, 0.1]), 0.7);
        assert_eq!(confidence(&[f64::NAN, 0.4]), 0.4);
        assert_eq!(confidence(&[1.0000001]), 1.0);
        assert_eq!(confidence(&[]), 0.0);
    }
}
