//! Artifact loading
//!
//! The nine artifacts (scaler, classifier and label decoder for each domain)
//! are read once from a directory and validated against the feature layout.
//! Any missing or inconsistent artifact is a startup failure.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::PulseError;
use crate::features::feature_names;
use crate::model::classifier::Classifier;
use crate::model::labels::LabelEncoder;
use crate::model::onnx::OnnxClassifier;
use crate::model::scaler::StandardScaler;
use crate::types::Domain;

/// Artifact role within a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Scaler,
    Model,
    LabelEncoder,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Scaler,
        ArtifactKind::Model,
        ArtifactKind::LabelEncoder,
    ];

    /// File name of the artifact for a domain
    pub fn file_name(&self, domain: Domain) -> &'static str {
        match (domain, self) {
            (Domain::Burnout, ArtifactKind::Scaler) => "burnout_scaler.json",
            (Domain::Burnout, ArtifactKind::Model) => "burnout_model.onnx",
            (Domain::Burnout, ArtifactKind::LabelEncoder) => "burnout_label_encoder.json",
            (Domain::Performance, ArtifactKind::Scaler) => "performance_scaler.json",
            (Domain::Performance, ArtifactKind::Model) => "performance_rf_model.onnx",
            (Domain::Performance, ArtifactKind::LabelEncoder) => "performance_label_encoder.json",
            (Domain::Growth, ArtifactKind::Scaler) => "growth_scaler.json",
            (Domain::Growth, ArtifactKind::Model) => "growth_potential_model.onnx",
            (Domain::Growth, ArtifactKind::LabelEncoder) => "growth_label_encoder.json",
        }
    }
}

/// Scaler, classifier and label decoder for one domain
#[derive(Debug, Clone)]
pub struct DomainModel {
    pub domain: Domain,
    pub scaler: StandardScaler,
    pub classifier: Arc<dyn Classifier>,
    pub labels: LabelEncoder,
}

impl DomainModel {
    /// Assemble and validate a domain model
    pub fn new(
        domain: Domain,
        scaler: StandardScaler,
        classifier: Arc<dyn Classifier>,
        labels: LabelEncoder,
    ) -> Result<Self, PulseError> {
        let n_features = feature_names(domain).len();
        let model_file = ArtifactKind::Model.file_name(domain);

        scaler
            .validate(n_features)
            .map_err(|e| PulseError::invalid_artifact(ArtifactKind::Scaler.file_name(domain), e))?;
        labels.validate().map_err(|e| {
            PulseError::invalid_artifact(ArtifactKind::LabelEncoder.file_name(domain), e)
        })?;

        if classifier.n_features() != n_features {
            return Err(PulseError::invalid_artifact(
                model_file,
                format!(
                    "classifier expects {} features, feature vector has {}",
                    classifier.n_features(),
                    n_features
                ),
            ));
        }

        if classifier.n_classes() != labels.n_classes() {
            return Err(PulseError::invalid_artifact(
                model_file,
                format!(
                    "classifier predicts {} classes but the label encoder knows {}",
                    classifier.n_classes(),
                    labels.n_classes()
                ),
            ));
        }

        Ok(Self {
            domain,
            scaler,
            classifier,
            labels,
        })
    }

    /// Load a domain model from a directory
    pub fn load(dir: &Path, domain: Domain) -> Result<Self, PulseError> {
        let scaler = load_artifact(&artifact_path(dir, domain, ArtifactKind::Scaler))?;
        let labels = load_artifact(&artifact_path(dir, domain, ArtifactKind::LabelEncoder))?;
        let classifier = OnnxClassifier::load(
            &artifact_path(dir, domain, ArtifactKind::Model),
            feature_names(domain).len(),
        )?;
        Self::new(domain, scaler, Arc::new(classifier), labels)
    }
}

/// Process-wide read-only model state
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub burnout: DomainModel,
    pub performance: DomainModel,
    pub growth: DomainModel,
}

impl ModelArtifacts {
    /// Load all nine artifacts from `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, PulseError> {
        let dir = dir.as_ref();
        let artifacts = Self {
            burnout: DomainModel::load(dir, Domain::Burnout)?,
            performance: DomainModel::load(dir, Domain::Performance)?,
            growth: DomainModel::load(dir, Domain::Growth)?,
        };

        tracing::info!(
            model_dir = %dir.display(),
            burnout_classes = artifacts.burnout.labels.n_classes(),
            performance_classes = artifacts.performance.labels.n_classes(),
            growth_classes = artifacts.growth.labels.n_classes(),
            "model artifacts loaded"
        );

        Ok(artifacts)
    }
}

/// Path of one artifact inside the model directory
pub fn artifact_path(dir: &Path, domain: Domain, kind: ArtifactKind) -> PathBuf {
    dir.join(kind.file_name(domain))
}

/// Read and decode one JSON artifact
pub fn load_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, PulseError> {
    if !path.exists() {
        return Err(PulseError::ArtifactMissing(path.to_path_buf()));
    }

    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        PulseError::invalid_artifact(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            e.to_string(),
        )
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::classifier::tests::FixedClassifier;
    use crate::model::onnx::tests::constant_model_bytes;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const BURNOUT_CLASSES: [&str; 3] = ["High", "Low", "Medium"];
    const PERFORMANCE_CLASSES: [&str; 3] = ["Declining", "Improving", "Stable"];
    const GROWTH_CLASSES: [&str; 3] = ["High-Potential", "Low-Potential", "Medium-Potential"];

    fn winner(classes: &[&str], label: &str) -> usize {
        classes.iter().position(|c| *c == label).unwrap()
    }

    /// Domain model whose classifier always favours `winner` with probability 0.7
    pub(crate) fn constant_model(domain: Domain, classes: &[&str], winner: usize) -> DomainModel {
        let n_features = feature_names(domain).len();

        DomainModel::new(
            domain,
            StandardScaler::identity(n_features),
            Arc::new(FixedClassifier::favouring(n_features, classes.len(), winner)),
            LabelEncoder::new(classes.iter().copied()),
        )
        .unwrap()
    }

    /// Artifacts predicting the given labels for every employee
    pub(crate) fn constant_artifacts(burnout: &str, performance: &str, growth: &str) -> ModelArtifacts {
        ModelArtifacts {
            burnout: constant_model(Domain::Burnout, &BURNOUT_CLASSES, winner(&BURNOUT_CLASSES, burnout)),
            performance: constant_model(
                Domain::Performance,
                &PERFORMANCE_CLASSES,
                winner(&PERFORMANCE_CLASSES, performance),
            ),
            growth: constant_model(Domain::Growth, &GROWTH_CLASSES, winner(&GROWTH_CLASSES, growth)),
        }
    }

    /// Write a complete artifact directory whose ONNX classifiers predict the given labels
    pub(crate) fn write_model_dir(dir: &Path, burnout: &str, performance: &str, growth: &str) {
        for (domain, classes, label) in [
            (Domain::Burnout, &BURNOUT_CLASSES, burnout),
            (Domain::Performance, &PERFORMANCE_CLASSES, performance),
            (Domain::Growth, &GROWTH_CLASSES, growth),
        ] {
            let n_features = feature_names(domain).len();
            fs::write(
                artifact_path(dir, domain, ArtifactKind::Scaler),
                serde_json::to_string_pretty(&StandardScaler::identity(n_features)).unwrap(),
            )
            .unwrap();
            fs::write(
                artifact_path(dir, domain, ArtifactKind::LabelEncoder),
                serde_json::to_string_pretty(&LabelEncoder::new(classes.iter().copied())).unwrap(),
            )
            .unwrap();
            fs::write(
                artifact_path(dir, domain, ArtifactKind::Model),
                constant_model_bytes(n_features, classes.len(), winner(classes, label)),
            )
            .unwrap();
        }
    }

    #[test]
    fn test_load_from_directory() {
        let dir = TempDir::new().unwrap();
        write_model_dir(dir.path(), "Medium", "Stable", "Low-Potential");

        let loaded = ModelArtifacts::load(dir.path()).unwrap();
        assert_eq!(loaded.burnout.labels.classes, BURNOUT_CLASSES);
        assert_eq!(loaded.growth.classifier.n_features(), 8);
        assert_eq!(loaded.performance.classifier.n_classes(), 3);

        let row = vec![0.0; 7];
        let scores = loaded.burnout.classifier.predict(&row).unwrap();
        assert_eq!(loaded.burnout.labels.inverse_transform(scores.class), Some("Medium"));
    }

    #[test]
    fn test_missing_artifact_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_model_dir(dir.path(), "Low", "Stable", "Low-Potential");
        fs::remove_file(dir.path().join("growth_label_encoder.json")).unwrap();

        let err = ModelArtifacts::load(dir.path()).unwrap_err();
        match err {
            PulseError::ArtifactMissing(path) => {
                assert!(path.ends_with("growth_label_encoder.json"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_classifier_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_model_dir(dir.path(), "Low", "Stable", "Low-Potential");
        fs::remove_file(dir.path().join("performance_rf_model.onnx")).unwrap();

        let err = ModelArtifacts::load(dir.path()).unwrap_err();
        assert!(matches!(err, PulseError::ArtifactMissing(ref path) if path.ends_with("performance_rf_model.onnx")));
    }

    #[test]
    fn test_malformed_artifact_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_model_dir(dir.path(), "Low", "Stable", "Low-Potential");
        fs::write(dir.path().join("burnout_scaler.json"), "{ not json").unwrap();

        let err = ModelArtifacts::load(dir.path()).unwrap_err();
        assert!(matches!(err, PulseError::ArtifactInvalid { ref artifact, .. } if artifact == "burnout_scaler.json"));
    }

    #[test]
    fn test_malformed_classifier_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_model_dir(dir.path(), "Low", "Stable", "Low-Potential");
        fs::write(dir.path().join("growth_potential_model.onnx"), b"pickle bytes").unwrap();

        let err = ModelArtifacts::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            PulseError::ArtifactInvalid { ref artifact, .. } if artifact == "growth_potential_model.onnx"
        ));
    }

    #[test]
    fn test_class_count_mismatch_rejected() {
        let n = feature_names(Domain::Burnout).len();
        let result = DomainModel::new(
            Domain::Burnout,
            StandardScaler::identity(n),
            Arc::new(FixedClassifier::favouring(n, 3, 0)),
            LabelEncoder::new(["High", "Low"]),
        );
        assert!(matches!(
            result,
            Err(PulseError::ArtifactInvalid { ref artifact, .. }) if artifact == "burnout_model.onnx"
        ));
    }

    #[test]
    fn test_feature_width_mismatch_rejected() {
        let result = DomainModel::new(
            Domain::Growth,
            StandardScaler::identity(8),
            Arc::new(FixedClassifier::favouring(7, 2, 0)),
            LabelEncoder::new(["Low-Potential", "High-Potential"]),
        );
        assert!(matches!(
            result,
            Err(PulseError::ArtifactInvalid { ref artifact, .. }) if artifact == "growth_potential_model.onnx"
        ));

        let result = DomainModel::new(
            Domain::Growth,
            StandardScaler::identity(7),
            Arc::new(FixedClassifier::favouring(8, 2, 0)),
            LabelEncoder::new(["Low-Potential", "High-Potential"]),
        );
        assert!(matches!(
            result,
            Err(PulseError::ArtifactInvalid { ref artifact, .. }) if artifact == "growth_scaler.json"
        ));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            ArtifactKind::Model.file_name(Domain::Performance),
            "performance_rf_model.onnx"
        );
        assert_eq!(
            ArtifactKind::Model.file_name(Domain::Growth),
            "growth_potential_model.onnx"
        );
    }
}
