use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub api_addr: String,
    pub artifacts_dir: String,
    pub model_path: String,
    pub gender_encoder_path: String,
    pub geography_encoder_path: String,
    pub scaler_path: String,
    pub cors_origin: String,
    pub recent_limit: usize,
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests do not have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_addr = lookup("CHURN_API_ADDR")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "127.0.0.1:8501".to_string());

        let artifacts_dir = normalize_path(
            lookup("CHURN_ARTIFACTS_DIR"),
            &default_artifacts_dir(),
        );
        let dir = PathBuf::from(&artifacts_dir);

        let model_path = normalize_path(lookup("CHURN_MODEL_PATH"), &dir.join("model.json"));
        let gender_encoder_path = normalize_path(
            lookup("CHURN_GENDER_ENCODER_PATH"),
            &dir.join("label_encoder_gender.json"),
        );
        let geography_encoder_path = normalize_path(
            lookup("CHURN_GEO_ENCODER_PATH"),
            &dir.join("onehot_encoder_geo.json"),
        );
        let scaler_path = normalize_path(lookup("CHURN_SCALER_PATH"), &dir.join("scaler.json"));

        let cors_origin = lookup("CHURN_CORS_ORIGIN")
            .unwrap_or_else(|| "http://localhost:8501,http://127.0.0.1:8501".to_string());

        let recent_limit = lookup("CHURN_RECENT_LIMIT")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .map(clamp_recent_limit)
            .unwrap_or(50);

        CoreConfig {
            api_addr,
            artifacts_dir,
            model_path,
            gender_encoder_path,
            geography_encoder_path,
            scaler_path,
            cors_origin,
            recent_limit,
        }
    }
}

fn normalize_path(value: Option<String>, default: &Path) -> String {
    match value {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string_lossy().to_string(),
    }
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("artifacts")
}

fn clamp_recent_limit(value: usize) -> usize {
    value.clamp(1, 500)
}
