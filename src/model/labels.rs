//! Label decoder artifact

use serde::{Deserialize, Serialize};

/// Maps class indices back to human-readable labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<S: Into<String>>(classes: impl IntoIterator<Item = S>) -> Self {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Decode a class index
    pub fn inverse_transform(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("no classes".to_string());
        }
        if self.classes.iter().any(|c| c.trim().is_empty()) {
            return Err("contains an empty class label".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_transform() {
        let encoder = LabelEncoder::new(["High", "Low", "Medium"]);

        assert_eq!(encoder.inverse_transform(0), Some("High"));
        assert_eq!(encoder.inverse_transform(2), Some("Medium"));
        assert_eq!(encoder.inverse_transform(3), None);
    }

    #[test]
    fn test_validate() {
        assert!(LabelEncoder::new(["Stable"]).validate().is_ok());
        assert!(LabelEncoder::new(Vec::<String>::new()).validate().is_err());
        assert!(LabelEncoder::new(["Stable", " "]).validate().is_err());
    }
}
