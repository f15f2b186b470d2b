use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, PredictError};

/// Fitted per-column affine scaler: `(x - mean) / scale`.
///
/// `mean` is absent when the scaler was fit without centering, `scale` is
/// absent when it was fit without scaling. At least one of them is required
/// to know the width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
    /// Column names seen at fit time, when recorded.
    #[serde(default)]
    pub feature_names_in: Vec<String>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            mean: Some(mean),
            scale: Some(scale),
            feature_names_in: Vec::new(),
        }
    }

    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names_in = names;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn width(&self) -> usize {
        self.mean
            .as_ref()
            .or(self.scale.as_ref())
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        const ARTIFACT: &str = "scaler";

        let width = self.width();
        if width == 0 {
            return Err(ArtifactError::invalid(ARTIFACT, "no mean or scale columns"));
        }

        if let Some(mean) = self.mean.as_ref() {
            if let Some(index) = mean.iter().position(|value| !value.is_finite()) {
                return Err(ArtifactError::invalid(
                    ARTIFACT,
                    format!("non-finite mean at column {}", index),
                ));
            }
        }

        if let Some(scale) = self.scale.as_ref() {
            if scale.len() != width {
                return Err(ArtifactError::invalid(
                    ARTIFACT,
                    format!("mean has {} columns but scale has {}", width, scale.len()),
                ));
            }
            if let Some(index) = scale
                .iter()
                .position(|value| !value.is_finite() || *value == 0.0)
            {
                return Err(ArtifactError::invalid(
                    ARTIFACT,
                    format!("scale at column {} must be finite and non-zero", index),
                ));
            }
        }

        if !self.feature_names_in.is_empty() && self.feature_names_in.len() != width {
            return Err(ArtifactError::invalid(
                ARTIFACT,
                format!(
                    "{} feature names for {} columns",
                    self.feature_names_in.len(),
                    width
                ),
            ));
        }

        Ok(())
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, PredictError> {
        let width = self.width();
        if features.len() != width {
            return Err(PredictError::ShapeMismatch {
                stage: "scaler",
                expected: width,
                got: features.len(),
            });
        }

        let scaled = features
            .iter()
            .enumerate()
            .map(|(column, value)| {
                let centered = match self.mean.as_ref() {
                    Some(mean) => value - mean[column],
                    None => *value,
                };
                match self.scale.as_ref() {
                    Some(scale) => centered / scale[column],
                    None => centered,
                }
            })
            .collect();

        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_mean_and_scale_per_column() {
        let scaler = StandardScaler::new(vec![10.0, 0.0], vec![2.0, 4.0]);
        scaler.validate().unwrap();
        assert_eq!(scaler.transform(&[14.0, -8.0]).unwrap(), vec![2.0, -2.0]);
    }

    #[test]
    fn missing_mean_only_scales() {
        let scaler = StandardScaler::from_json(r#"{"mean": null, "scale": [2.0, 5.0]}"#).unwrap();
        scaler.validate().unwrap();
        assert_eq!(scaler.width(), 2);
        assert_eq!(scaler.transform(&[4.0, 5.0]).unwrap(), vec![2.0, 1.0]);
    }

    #[test]
    fn width_mismatch_is_a_shape_error() {
        let scaler = StandardScaler::new(vec![0.0; 3], vec![1.0; 3]);
        match scaler.transform(&[1.0, 2.0]) {
            Err(PredictError::ShapeMismatch {
                stage,
                expected,
                got,
            }) => {
                assert_eq!(stage, "scaler");
                assert_eq!(expected, 3);
                assert_eq!(got, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_zero_scale_and_uneven_columns() {
        assert!(StandardScaler::new(vec![0.0, 0.0], vec![1.0, 0.0])
            .validate()
            .is_err());
        assert!(StandardScaler::new(vec![0.0, 0.0], vec![1.0])
            .validate()
            .is_err());
        assert!(StandardScaler::new(vec![0.0], vec![1.0])
            .with_feature_names(vec!["a".into(), "b".into()])
            .validate()
            .is_err());
    }
}
