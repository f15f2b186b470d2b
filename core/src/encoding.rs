//! Fitted categorical encoders.
//!
//! Both encoders are loaded from JSON and only ever used for lookups. An
//! unseen category is returned as a [`LookupError`] instead of defaulting.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, LookupError};

/// Maps a category to the index of its class in the fitted class list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        validate_categories("gender label encoder", &self.classes)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self, field: &'static str, value: &str) -> Result<usize, LookupError> {
        self.classes
            .iter()
            .position(|class| class == value)
            .ok_or_else(|| LookupError {
                field,
                value: value.to_string(),
                known: self.classes.clone(),
            })
    }
}

/// Expands a category into one column per fitted category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub categories: Vec<String>,
    /// Input column name used as prefix of the output columns.
    pub feature_name: String,
}

impl OneHotEncoder {
    pub fn new(feature_name: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            categories,
            feature_name: feature_name.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.feature_name.trim().is_empty() {
            return Err(ArtifactError::invalid(
                "geography one-hot encoder",
                "feature_name is empty",
            ));
        }
        validate_categories("geography one-hot encoder", &self.categories)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Output column names in fitted order, e.g. `Geography_France`.
    pub fn feature_names_out(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|category| format!("{}_{}", self.feature_name, category))
            .collect()
    }

    pub fn transform(&self, field: &'static str, value: &str) -> Result<Vec<f64>, LookupError> {
        let hot = self
            .categories
            .iter()
            .position(|category| category == value)
            .ok_or_else(|| LookupError {
                field,
                value: value.to_string(),
                known: self.categories.clone(),
            })?;

        let mut encoded = vec![0.0; self.categories.len()];
        encoded[hot] = 1.0;
        Ok(encoded)
    }
}

fn validate_categories(artifact: &'static str, categories: &[String]) -> Result<(), ArtifactError> {
    if categories.is_empty() {
        return Err(ArtifactError::invalid(artifact, "no categories"));
    }

    let mut seen = HashSet::new();
    for category in categories {
        if category.trim().is_empty() {
            return Err(ArtifactError::invalid(artifact, "empty category name"));
        }
        if !seen.insert(category.as_str()) {
            return Err(ArtifactError::invalid(
                artifact,
                format!("duplicate category '{}'", category),
            ));
        }
    }

    Ok(())
}
