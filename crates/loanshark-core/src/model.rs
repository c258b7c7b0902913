use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Deserialize;
use thiserror::Error;

use crate::features::FeatureSet;

pub const MODEL_FILE: &str = "loanshark_model.json";
pub const SCHEMA_FILE: &str = "feature_schema.json";

const LOGISTIC_REGRESSION: &str = "logistic_regression";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model carries {coefficients} coefficients but schema lists {features} features")]
    SchemaMismatch {
        coefficients: usize,
        features: usize,
    },
    #[error("unsupported model type `{0}`")]
    UnsupportedModelType(String),
}

/// Ordered feature-name list defining the model's vector layout, plus
/// optional metadata. Versioned alongside the artifact; read-only.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureSchema {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub model_type: Option<String>,
}

impl FeatureSchema {
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }
}

/// The classifier artifact: a logistic regression exported to JSON, exposing
/// `predict(vector) -> probability`.
#[derive(Debug, Clone, Deserialize)]
struct ModelArtifact {
    model_type: String,
    coefficients: Vec<f64>,
    intercept: f64,
}

/// Classifier plus schema, loaded once and immutable for the process
/// lifetime. Any load or inference failure downgrades to rule-only scoring
/// at the combiner; it is never surfaced to the caller as an error.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    schema: FeatureSchema,
    artifact: ModelArtifact,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MlPrediction {
    /// Probability of the predatory class, in [0, 1].
    pub prob: f64,
    /// `round(prob * 100)`.
    pub score: u8,
}

impl ModelBundle {
    /// Load the artifact/schema pair from a directory containing
    /// `loanshark_model.json` and `feature_schema.json`.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        let schema_path = dir.join(SCHEMA_FILE);
        let schema: FeatureSchema = read_json(&schema_path)?;

        let model_path = dir.join(MODEL_FILE);
        let artifact: ModelArtifact = read_json(&model_path)?;

        if artifact.model_type != LOGISTIC_REGRESSION {
            return Err(ModelError::UnsupportedModelType(artifact.model_type));
        }
        if artifact.coefficients.len() != schema.feature_count() {
            return Err(ModelError::SchemaMismatch {
                coefficients: artifact.coefficients.len(),
                features: schema.feature_count(),
            });
        }

        Ok(Self { schema, artifact })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Encode a FeatureSet as a vector ordered per the schema. Feature names
    /// the extractor does not know encode to 0.
    pub fn vectorize(&self, features: &FeatureSet) -> Vec<f64> {
        self.schema
            .feature_names
            .iter()
            .map(|name| features.value(name))
            .collect()
    }

    /// Probability for an already-encoded vector, or None when the vector
    /// does not fit the model. Inference failure is a degrade signal.
    pub fn predict(&self, vector: &[f64]) -> Option<f64> {
        if vector.len() != self.artifact.coefficients.len() {
            return None;
        }

        let z = self
            .artifact
            .coefficients
            .iter()
            .zip(vector)
            .map(|(coefficient, value)| coefficient * value)
            .sum::<f64>()
            + self.artifact.intercept;

        if !z.is_finite() {
            return None;
        }

        Some(sigmoid(z).clamp(0.0, 1.0))
    }

    pub fn predict_features(&self, features: &FeatureSet) -> Option<MlPrediction> {
        let prob = self.predict(&self.vectorize(features))?;
        Some(MlPrediction {
            prob,
            score: (prob * 100.0).round() as u8,
        })
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let content = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

static SHARED_MODEL: OnceCell<Option<Arc<ModelBundle>>> = OnceCell::new();

/// Process-wide model handle, initialized on first access and never mutated
/// afterwards. Concurrent first calls may race on the load; the load is
/// idempotent over the immutable artifact so the race is harmless. A failed
/// load pins `None` and the process stays in rule-only mode.
pub fn shared_model(dir: &Path) -> Option<Arc<ModelBundle>> {
    SHARED_MODEL
        .get_or_init(|| ModelBundle::load(dir).ok().map(Arc::new))
        .clone()
}
