use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// A required lead feature was absent from the input (caller's fault).
    MissingFeature(String),
    /// Bad request error (invalid input, e.g. a non-integer feature value).
    BadRequest(String),
    /// No conversion model has been loaded or trained yet.
    ModelUnavailable(String),
    /// Model training failed (malformed dataset, degenerate labels, ...).
    Training(String),
    /// Artifact or dataset storage error (I/O, serialization, corruption).
    Storage(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingFeature(field) => {
                write!(f, "Missing required lead feature: {}", field)
            }
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ModelUnavailable(msg) => write!(f, "Model unavailable: {}", msg),
            AppError::Training(msg) => write!(f, "Training failed: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Input-contract violations map to client errors; an absent model maps to
    /// 503 so callers can retry once bootstrap training completes; everything
    /// else is a 500 with internals redacted from the body.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MissingFeature(field) => {
                tracing::warn!("Rejected lead with missing feature: {}", field);
                (
                    StatusCode::BAD_REQUEST,
                    format!("Missing required lead feature: {}", field),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ModelUnavailable(msg) => {
                tracing::error!("Scoring requested with no model available: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Conversion model is not available".to_string(),
                )
            }
            AppError::Training(msg) => {
                tracing::error!("Model training failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Model training failed: {}", msg),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::WithContext { source, context } => {
                // Log full context chain for debugging
                tracing::error!("Error with context: {} -> {}", context, source);
                // Delegate to underlying error's response
                return source.clone().into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<std::io::Error> for AppError {
    /// Converts an I/O error into an `AppError`.
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    /// Converts a JSON (de)serialization error into an `AppError`.
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    /// Converts a CSV (de)serialization error into an `AppError`.
    fn from(err: csv::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    #[allow(dead_code)]
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for std::io::Error to add context
impl<T> ResultExt<T> for Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Storage(e.to_string())),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::Storage(e.to_string())),
            context: f(),
        })
    }
}
