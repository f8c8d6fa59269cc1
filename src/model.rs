use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::AppError;
use crate::features::{FeatureVector, FEATURE_COLUMNS, FEATURE_SCHEMA_VERSION};
use crate::models::ModelInfo;

/// A fitted logistic conversion classifier.
///
/// Weights and bias apply directly to raw (unscaled) feature vectors in
/// `FEATURE_COLUMNS` order. Instances are immutable after training; a retrain
/// produces a fresh value that replaces the old one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionModel {
    /// Unique identifier of this trained artifact.
    pub model_id: Uuid,
    /// Feature schema version the model was fitted against.
    pub schema_version: u32,
    /// Ordered feature column names, recorded for load-time verification.
    pub feature_columns: Vec<String>,
    /// Weight per feature, in `feature_columns` order.
    pub weights: Vec<f64>,
    /// Intercept of the linear decision function.
    pub bias: f64,
    /// Accuracy on the held-out partition at training time.
    pub holdout_accuracy: f64,
    /// When the model was trained.
    pub trained_at: DateTime<Utc>,
}

impl ConversionModel {
    /// Probability of the positive class (conversion) for a feature vector.
    ///
    /// Linear combination through the logistic link. Deterministic: the same
    /// model and vector always produce the same probability.
    pub fn predict_probability(&self, vector: &FeatureVector) -> f64 {
        let linear = self.bias
            + vector
                .iter()
                .zip(self.weights.iter())
                .map(|(x, w)| x * w)
                .sum::<f64>();
        1.0 / (1.0 + (-linear).exp())
    }

    /// Caller-safe metadata view of this model (no raw parameters).
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            model_id: self.model_id,
            schema_version: self.schema_version,
            feature_columns: self.feature_columns.clone(),
            holdout_accuracy: self.holdout_accuracy,
            trained_at: self.trained_at,
        }
    }

    /// Verifies the model matches the feature schema compiled into this
    /// binary. A mismatch means the artifact was produced by an incompatible
    /// build and must not be used for scoring.
    fn verify_schema(&self) -> Result<(), AppError> {
        if self.schema_version != FEATURE_SCHEMA_VERSION {
            return Err(AppError::Storage(format!(
                "model artifact schema version {} does not match expected {}",
                self.schema_version, FEATURE_SCHEMA_VERSION
            )));
        }
        if self.feature_columns != FEATURE_COLUMNS {
            return Err(AppError::Storage(format!(
                "model artifact feature columns {:?} do not match expected {:?}",
                self.feature_columns, FEATURE_COLUMNS
            )));
        }
        if self.weights.len() != FEATURE_COLUMNS.len() {
            return Err(AppError::Storage(format!(
                "model artifact has {} weights, expected {}",
                self.weights.len(),
                FEATURE_COLUMNS.len()
            )));
        }
        Ok(())
    }
}

/// On-disk representation: the serialized model plus a checksum of its bytes.
#[derive(Debug, Serialize, Deserialize)]
struct ModelArtifact {
    /// SHA-256 over the serialized `model` value.
    sha256: String,
    /// The fitted model parameters and metadata.
    model: ConversionModel,
}

/// Durable storage for the conversion model artifact.
///
/// A single well-known JSON blob. Writes go through a temp file in the same
/// directory followed by an atomic rename, so a concurrent reader never
/// observes a partially written artifact and a failed write never corrupts
/// the previous one.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the artifact slot.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted model, if any.
    ///
    /// Returns `Ok(None)` when no artifact exists yet (the recoverable
    /// bootstrap case). A present but unreadable, checksum-mismatched, or
    /// schema-incompatible artifact is an error: callers must treat that as
    /// fatal rather than silently retrain over data they cannot inspect.
    pub fn load(&self) -> Result<Option<ConversionModel>, AppError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "failed to read model artifact {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            AppError::Storage(format!(
                "corrupt model artifact {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let digest = parameter_digest(&artifact.model)?;
        if digest != artifact.sha256 {
            return Err(AppError::Storage(format!(
                "model artifact {} failed checksum verification",
                self.path.display()
            )));
        }

        artifact.model.verify_schema()?;

        tracing::info!(
            "Loaded conversion model {} (accuracy {:.2}) from {}",
            artifact.model.model_id,
            artifact.model.holdout_accuracy,
            self.path.display()
        );
        Ok(Some(artifact.model))
    }

    /// Persists a model, replacing any previous artifact atomically.
    pub fn save(&self, model: &ConversionModel) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::Storage(format!(
                        "failed to create artifact directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let artifact = ModelArtifact {
            sha256: parameter_digest(model)?,
            model: model.clone(),
        };
        let serialized = serde_json::to_string_pretty(&artifact)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized).map_err(|e| {
            AppError::Storage(format!(
                "failed to write model artifact {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            AppError::Storage(format!(
                "failed to publish model artifact {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::info!(
            "Persisted conversion model {} to {}",
            model.model_id,
            self.path.display()
        );
        Ok(())
    }
}

/// SHA-256 hex digest over the canonical JSON serialization of the model.
fn parameter_digest(model: &ConversionModel) -> Result<String, AppError> {
    let bytes = serde_json::to_vec(model)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
