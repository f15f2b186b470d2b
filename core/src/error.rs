use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading the fitted artifacts. The process cannot serve.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {artifact}: {reason}")]
    Invalid {
        artifact: &'static str,
        reason: String,
    },

    #[error("artifacts disagree on the feature schema: {reason}")]
    SchemaMismatch { reason: String },
}

impl ArtifactError {
    pub fn invalid(artifact: &'static str, reason: impl Into<String>) -> Self {
        ArtifactError::Invalid {
            artifact,
            reason: reason.into(),
        }
    }

    pub fn schema(reason: impl Into<String>) -> Self {
        ArtifactError::SchemaMismatch {
            reason: reason.into(),
        }
    }
}

/// A category that the fitted encoder never saw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {field} '{value}' (known: {})", .known.join(", "))]
pub struct LookupError {
    pub field: &'static str,
    pub value: String,
    pub known: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    UnknownCategory(#[from] LookupError),

    #[error("{stage} expects {expected} columns, got {got}")]
    ShapeMismatch {
        stage: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("non-finite value at {stage}")]
    NonFinite { stage: &'static str },
}

impl PredictError {
    /// Short machine-readable label used by the JSON API.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::UnknownCategory(_) => "unknown_category",
            PredictError::ShapeMismatch { .. } => "shape_mismatch",
            PredictError::NonFinite { .. } => "non_finite",
        }
    }

    /// Shape errors come from a code defect, never from user input.
    pub fn is_defect(&self) -> bool {
        matches!(self, PredictError::ShapeMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_error_lists_known_categories() {
        let error = LookupError {
            field: "geography",
            value: "Italy".to_string(),
            known: vec!["France".to_string(), "Spain".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "unknown geography 'Italy' (known: France, Spain)"
        );
    }

    #[test]
    fn only_shape_errors_are_defects() {
        let shape = PredictError::ShapeMismatch {
            stage: "scaler",
            expected: 12,
            got: 11,
        };
        assert!(shape.is_defect());
        assert_eq!(shape.kind(), "shape_mismatch");

        let lookup = PredictError::from(LookupError {
            field: "gender",
            value: "x".to_string(),
            known: Vec::new(),
        });
        assert!(!lookup.is_defect());
        assert_eq!(lookup.kind(), "unknown_category");
    }
}
