//! Standard scaler artifact

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::PulseError;

/// Per-feature standardisation: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Identity scaler for `n` features
    pub fn identity(n: usize) -> Self {
        Self {
            mean: vec![0.0; n],
            scale: vec![1.0; n],
        }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Check the scaler against the expected feature width
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.mean.len() != n_features {
            return Err(format!(
                "expects {} features, feature vector has {}",
                self.mean.len(),
                n_features
            ));
        }
        if self.mean.iter().chain(self.scale.iter()).any(|v| !v.is_finite()) {
            return Err("contains non-finite values".to_string());
        }
        Ok(())
    }

    /// Scale a feature row into classifier input. Zero scale behaves as unit scale.
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f32>, PulseError> {
        if values.len() != self.n_features() {
            return Err(PulseError::Inference(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                values.len()
            )));
        }

        let x = ArrayView1::from(values);
        let mean = ArrayView1::from(self.mean.as_slice());
        let scale: Array1<f64> = ArrayView1::from(self.scale.as_slice())
            .mapv(|s| if s == 0.0 { 1.0 } else { s });

        Ok(((&x - &mean) / &scale).mapv(|v| v as f32).to_vec())
    }
}
