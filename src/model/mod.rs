//! Pre-trained model artifacts
//!
//! Each domain is scored by three artifacts: a standard scaler, an ONNX
//! classifier and a label decoder. They are loaded once and never mutated.

pub mod artifacts;
pub mod classifier;
pub mod labels;
pub mod onnx;
pub mod scaler;

pub use artifacts::{artifact_path, load_artifact, ArtifactKind, DomainModel, ModelArtifacts};
pub use classifier::{ClassScores, Classifier};
pub use labels::LabelEncoder;
pub use onnx::OnnxClassifier;
pub use scaler::StandardScaler;
