//! Loading of the fitted transforms and the trained model.
//!
//! Everything here runs once at startup. The resulting [`InferenceContext`]
//! is immutable and shared by reference for the life of the process.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::CoreConfig;
use crate::encoding::{LabelEncoder, OneHotEncoder};
use crate::error::ArtifactError;
use crate::features;
use crate::ml::DenseNetwork;
use crate::scaler::StandardScaler;

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub gender_encoder: PathBuf,
    pub geography_encoder: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join("model.json"),
            gender_encoder: dir.join("label_encoder_gender.json"),
            geography_encoder: dir.join("onehot_encoder_geo.json"),
            scaler: dir.join("scaler.json"),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            model: PathBuf::from(&config.model_path),
            gender_encoder: PathBuf::from(&config.gender_encoder_path),
            geography_encoder: PathBuf::from(&config.geography_encoder_path),
            scaler: PathBuf::from(&config.scaler_path),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactFingerprint {
    pub name: &'static str,
    pub path: String,
    pub sha256: String,
}

/// Read-only state needed to serve predictions.
#[derive(Debug)]
pub struct InferenceContext {
    gender: LabelEncoder,
    geography: OneHotEncoder,
    scaler: StandardScaler,
    model: DenseNetwork,
    columns: Vec<String>,
    fingerprints: Vec<ArtifactFingerprint>,
}

impl InferenceContext {
    /// Builds a context from already parsed artifacts, checking that they agree
    /// on the feature schema.
    pub fn new(
        gender: LabelEncoder,
        geography: OneHotEncoder,
        scaler: StandardScaler,
        model: DenseNetwork,
    ) -> Result<Self, ArtifactError> {
        gender.validate()?;
        if gender.classes().len() != 2 {
            return Err(ArtifactError::invalid(
                "gender label encoder",
                format!("expected 2 classes, found {}", gender.classes().len()),
            ));
        }
        geography.validate()?;
        scaler.validate()?;
        model.validate()?;

        let columns = features::column_names(&geography);

        if scaler.width() != columns.len() {
            return Err(ArtifactError::schema(format!(
                "scaler has {} columns, encoders produce {}",
                scaler.width(),
                columns.len()
            )));
        }

        if !scaler.feature_names_in.is_empty() && scaler.feature_names_in != columns {
            return Err(ArtifactError::schema(format!(
                "scaler was fit on [{}], encoders produce [{}]",
                scaler.feature_names_in.join(", "),
                columns.join(", ")
            )));
        }

        if model.input_dim() != columns.len() {
            return Err(ArtifactError::schema(format!(
                "model expects {} inputs, encoders produce {}",
                model.input_dim(),
                columns.len()
            )));
        }

        Ok(Self {
            gender,
            geography,
            scaler,
            model,
            columns,
            fingerprints: Vec::new(),
        })
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let (model, model_bytes) = read_artifact(&paths.model, DenseNetwork::from_json)?;
        let (gender, gender_bytes) =
            read_artifact(&paths.gender_encoder, LabelEncoder::from_json)?;
        let (geography, geography_bytes) =
            read_artifact(&paths.geography_encoder, OneHotEncoder::from_json)?;
        let (scaler, scaler_bytes) = read_artifact(&paths.scaler, StandardScaler::from_json)?;

        let mut context = Self::new(gender, geography, scaler, model)?;
        context.fingerprints = vec![
            fingerprint("model", &paths.model, &model_bytes),
            fingerprint("gender_encoder", &paths.gender_encoder, &gender_bytes),
            fingerprint("geography_encoder", &paths.geography_encoder, &geography_bytes),
            fingerprint("scaler", &paths.scaler, &scaler_bytes),
        ];

        log::info!(
            "[ARTIFACTS] Loaded model '{}' ({} parameters), {} columns",
            context.model.model_id,
            context.model.parameter_count(),
            context.columns.len()
        );
        for entry in &context.fingerprints {
            log::info!("[ARTIFACTS] {} {} sha256={}", entry.name, entry.path, entry.sha256);
        }

        Ok(context)
    }

    pub fn gender(&self) -> &LabelEncoder {
        &self.gender
    }

    pub fn geography(&self) -> &OneHotEncoder {
        &self.geography
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn model(&self) -> &DenseNetwork {
        &self.model
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn fingerprints(&self) -> &[ArtifactFingerprint] {
        &self.fingerprints
    }
}

fn read_artifact<T, F>(path: &Path, parse: F) -> Result<(T, String), ArtifactError>
where
    F: FnOnce(&str) -> Result<T, serde_json::Error>,
{
    let data = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = parse(&data).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((value, data))
}

fn fingerprint(name: &'static str, path: &Path, data: &str) -> ArtifactFingerprint {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    ArtifactFingerprint {
        name,
        path: path.to_string_lossy().to_string(),
        sha256: format!("{:x}", hasher.finalize()),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::ml::Activation;

    #[test]
    fn loads_artifacts_from_disk_with_fingerprints() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path());
        let context = InferenceContext::load(&paths).unwrap();

        assert_eq!(context.columns().len(), 12);
        assert_eq!(context.fingerprints().len(), 4);
        for entry in context.fingerprints() {
            assert_eq!(entry.sha256.len(), 64);
        }
    }

    #[test]
    fn missing_file_is_startup_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path());
        std::fs::remove_file(&paths.scaler).unwrap();
        assert!(matches!(
            InferenceContext::load(&paths),
            Err(ArtifactError::Io { .. })
        ));
    }

    #[test]
    fn corrupt_file_is_startup_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path());
        std::fs::write(&paths.model, b"{ not json").unwrap();
        assert!(matches!(
            InferenceContext::load(&paths),
            Err(ArtifactError::Parse { .. })
        ));
    }

    #[test]
    fn scaler_width_must_match_encoders() {
        let geography = OneHotEncoder::new("Geography", vec!["France".into(), "Spain".into()]);
        let result = InferenceContext::new(gender(), geography, scaler(), model());
        assert!(matches!(result, Err(ArtifactError::SchemaMismatch { .. })));
    }

    #[test]
    fn scaler_feature_names_must_match_column_order() {
        let mut names = features::column_names(&geography());
        let matching = scaler().with_feature_names(names.clone());
        InferenceContext::new(gender(), geography(), matching, model()).unwrap();

        names.swap(0, 2);
        let swapped = scaler().with_feature_names(names);
        assert!(matches!(
            InferenceContext::new(gender(), geography(), swapped, model()),
            Err(ArtifactError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn model_input_must_match_encoders() {
        let mut network = model();
        network.input_dim = 11;
        network.layers[0].kernel.pop();
        assert!(matches!(
            InferenceContext::new(gender(), geography(), scaler(), network),
            Err(ArtifactError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn invalid_model_is_rejected_before_schema_checks() {
        let mut network = model();
        network.layers[0].activation = Activation::Relu;
        assert!(matches!(
            InferenceContext::new(gender(), geography(), scaler(), network),
            Err(ArtifactError::Invalid { artifact: "model", .. })
        ));
    }

    #[test]
    fn gender_encoder_must_be_binary() {
        let three = LabelEncoder::new(vec!["Female".into(), "Male".into(), "Other".into()]);
        assert!(matches!(
            InferenceContext::new(three, geography(), scaler(), model()),
            Err(ArtifactError::Invalid {
                artifact: "gender label encoder",
                ..
            })
        ));

        let one = LabelEncoder::new(vec!["Female".into()]);
        assert!(matches!(
            InferenceContext::new(one, geography(), scaler(), model()),
            Err(ArtifactError::Invalid {
                artifact: "gender label encoder",
                ..
            })
        ));
    }

    #[test]
    fn shipped_artifacts_are_consistent() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("artifacts");
        let context = InferenceContext::load(&ArtifactPaths::in_dir(&dir)).unwrap();
        assert_eq!(context.geography().categories(), ["France", "Germany", "Spain"]);
        assert_eq!(context.gender().classes(), ["Female", "Male"]);

        let sample = std::fs::read_to_string(dir.join("sample_record.json")).unwrap();
        let record = serde_json::from_str(&sample).unwrap();
        let prediction = crate::engine::predict(&context, &record).unwrap();
        assert!((0.0..=1.0).contains(&prediction.probability));
    }
}
