//! ONNX Runtime classifiers
//!
//! Classifiers are scikit-learn estimators exported with skl2onnx using
//! `options={"zipmap": False}`. Each graph takes one float input of shape
//! `[N, n_features]` and yields an int64 `label` output (encoded class index)
//! and a float `probabilities` output of shape `[N, n_classes]`.

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::path::Path;

use crate::error::PulseError;
use crate::model::classifier::{ClassScores, Classifier};

/// Name of the encoded-label output
pub const LABEL_OUTPUT: &str = "label";

/// Name of the class-probability output
pub const PROBABILITIES_OUTPUT: &str = "probabilities";

/// Classifier backed by an ONNX Runtime session
pub struct OnnxClassifier {
    // Session::run needs exclusive access
    session: Mutex<Session>,
    artifact: String,
    n_features: usize,
    n_classes: usize,
}

impl OnnxClassifier {
    /// Load a classifier and check it against the expected input width
    pub fn load(path: &Path, n_features: usize) -> Result<Self, PulseError> {
        if !path.exists() {
            return Err(PulseError::ArtifactMissing(path.to_path_buf()));
        }

        let artifact = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let session = Session::builder()
            .map_err(|e| PulseError::invalid_artifact(&artifact, format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| PulseError::invalid_artifact(&artifact, format!("optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| PulseError::invalid_artifact(&artifact, format!("load: {}", e)))?;

        Self::from_session(session, artifact, n_features)
    }

    /// Load a classifier from serialized ONNX bytes
    pub fn from_bytes(
        bytes: &[u8],
        artifact: impl Into<String>,
        n_features: usize,
    ) -> Result<Self, PulseError> {
        let artifact = artifact.into();

        let session = Session::builder()
            .map_err(|e| PulseError::invalid_artifact(&artifact, format!("session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| PulseError::invalid_artifact(&artifact, format!("optimization: {}", e)))?
            .commit_from_memory(bytes)
            .map_err(|e| PulseError::invalid_artifact(&artifact, format!("load: {}", e)))?;

        Self::from_session(session, artifact, n_features)
    }

    /// Check the graph outputs and learn the class count from a zero row
    fn from_session(mut session: Session, artifact: String, n_features: usize) -> Result<Self, PulseError> {
        for required in [LABEL_OUTPUT, PROBABILITIES_OUTPUT] {
            if !session.outputs.iter().any(|o| o.name == required) {
                return Err(PulseError::invalid_artifact(
                    &artifact,
                    format!("graph has no `{}` output", required),
                ));
            }
        }

        let warm_up = run(&mut session, &vec![0.0; n_features]).map_err(|e| {
            PulseError::invalid_artifact(&artifact, format!("{} features rejected: {}", n_features, e))
        })?;

        let n_classes = warm_up.probabilities.len();
        if n_classes == 0 || warm_up.class >= n_classes {
            return Err(PulseError::invalid_artifact(
                &artifact,
                format!("label {} outside {} probability columns", warm_up.class, n_classes),
            ));
        }

        tracing::debug!(artifact = %artifact, n_features, n_classes, "onnx classifier ready");

        Ok(Self {
            session: Mutex::new(session),
            artifact,
            n_features,
            n_classes,
        })
    }
}

/// Run one row through the session
fn run(session: &mut Session, row: &[f32]) -> Result<ClassScores, String> {
    let input = Array2::<f32>::from_shape_vec((1, row.len()), row.to_vec())
        .map_err(|e| format!("array: {}", e))?;
    let input_tensor = Value::from_array(input).map_err(|e| format!("tensor: {}", e))?;

    let outputs = session
        .run(ort::inputs![input_tensor])
        .map_err(|e| format!("inference: {}", e))?;

    let label = outputs
        .get(LABEL_OUTPUT)
        .ok_or_else(|| "no label output".to_string())?
        .try_extract_tensor::<i64>()
        .map_err(|e| format!("label: {}", e))?
        .1
        .first()
        .copied()
        .ok_or_else(|| "empty label output".to_string())?;

    let probabilities: Vec<f64> = outputs
        .get(PROBABILITIES_OUTPUT)
        .ok_or_else(|| "no probabilities output".to_string())?
        .try_extract_tensor::<f32>()
        .map_err(|e| format!("probabilities: {}", e))?
        .1
        .iter()
        .map(|p| *p as f64)
        .collect();

    let class = usize::try_from(label).map_err(|_| format!("negative label {}", label))?;

    Ok(ClassScores { class, probabilities })
}

impl Classifier for OnnxClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, row: &[f32]) -> Result<ClassScores, PulseError> {
        if row.len() != self.n_features {
            return Err(PulseError::Inference(format!(
                "{}: expected {} features, got {}",
                self.artifact,
                self.n_features,
                row.len()
            )));
        }

        let mut session = self.session.lock();
        run(&mut session, row).map_err(|e| PulseError::Inference(format!("{}: {}", self.artifact, e)))
    }
}

impl fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("artifact", &self.artifact)
            .field("n_features", &self.n_features)
            .field("n_classes", &self.n_classes)
            .finish()
    }
}
