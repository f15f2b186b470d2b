//! Customer churn prediction.
//!
//! A customer record is encoded with fitted categorical encoders, assembled
//! into a fixed column order, scaled, and passed through a pretrained
//! classifier. The resulting probability is compared against a fixed 0.5
//! threshold. All fitted artifacts are loaded once into an immutable
//! [`artifacts::InferenceContext`].

pub mod artifacts;
pub mod config;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod features;
pub mod http;
pub mod ml;
pub mod render;
pub mod scaler;
pub mod telemetry;
pub mod types;

pub use artifacts::{ArtifactPaths, InferenceContext};
pub use engine::predict;
pub use error::{ArtifactError, LookupError, PredictError};
pub use types::{CustomerRecord, Prediction, Verdict};
