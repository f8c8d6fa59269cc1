use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::errors::AppError;
use crate::model::{ConversionModel, ModelStore};
use crate::models::{lead_from_json, ModelInfo, RetrainResponse, ScoreResponse};
use crate::scoring;
use crate::trainer::Trainer;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::{Arc, RwLock};

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// The active conversion model: single-writer, many-reader cell.
    ///
    /// Readers clone the `Arc` and score against an immutable snapshot;
    /// retraining constructs and persists the new model fully before
    /// swapping it in, so no in-flight request ever observes a partially
    /// updated model. `None` only before initialization completes.
    model: RwLock<Option<Arc<ConversionModel>>>,
}

impl AppState {
    pub fn new(config: Config, model: Option<ConversionModel>) -> Self {
        Self {
            config,
            model: RwLock::new(model.map(Arc::new)),
        }
    }

    /// Snapshot of the active model, if one has been installed.
    pub fn current_model(&self) -> Option<Arc<ConversionModel>> {
        let guard = self
            .model
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone()
    }

    /// Atomically replaces the active model.
    pub fn install_model(&self, model: ConversionModel) {
        let mut guard = self
            .model
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(Arc::new(model));
    }
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-score-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/leads/score
///
/// Scores a single lead: coerces the JSON body into a lead mapping, runs the
/// scoring pipeline against the active model, and returns the prediction
/// with the echoed input.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `raw` - JSON body holding the lead's named signal values.
///
/// # Returns
///
/// * `Result<Json<ScoreResponse>, AppError>` - The scoring result or an error.
pub async fn score_lead(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<Json<ScoreResponse>, AppError> {
    tracing::info!("POST /leads/score - {} fields", raw.len());

    let lead = lead_from_json(&raw)?;
    let model = state.current_model().ok_or_else(|| {
        AppError::ModelUnavailable("no conversion model has been loaded or trained".to_string())
    })?;

    let prediction = scoring::score_lead(&model, &lead)?;
    tracing::info!(
        "Scored lead: {:.2}% -> {}",
        prediction.conversion_probability,
        prediction.category
    );

    Ok(Json(ScoreResponse {
        success: true,
        prediction,
    }))
}

/// POST /api/v1/model/retrain
///
/// Retrains the conversion model from the persisted training dataset
/// (materializing a synthetic one if absent), persists the new artifact, and
/// atomically swaps it into the serving state.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// * `Result<Json<RetrainResponse>, AppError>` - New accuracy and model metadata, or an error.
pub async fn retrain_model(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RetrainResponse>, AppError> {
    tracing::info!("POST /model/retrain");

    let config = state.config.clone();
    let (model, accuracy) = tokio::task::spawn_blocking(move || {
        let dataset = DatasetStore::new(&config.training_data_path);
        let samples = dataset.load_or_generate(config.synthetic_samples)?;
        Trainer::new(ModelStore::new(&config.model_path)).train(&samples)
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Training task panicked: {}", e)))??;

    let info = model.info();
    state.install_model(model);
    tracing::info!(
        "Retrained model {} now serving, accuracy {:.2}",
        info.model_id,
        accuracy
    );

    Ok(Json(RetrainResponse {
        success: true,
        accuracy,
        model: info,
    }))
}

/// GET /api/v1/model
///
/// Returns metadata of the active conversion model. Raw weights are never
/// exposed here; callers needing the parameters read the artifact directly.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// * `Result<Json<ModelInfo>, AppError>` - The active model's metadata or an error.
pub async fn model_info(State(state): State<Arc<AppState>>) -> Result<Json<ModelInfo>, AppError> {
    let model = state.current_model().ok_or_else(|| {
        AppError::ModelUnavailable("no conversion model has been loaded or trained".to_string())
    })?;
    Ok(Json(model.info()))
}
