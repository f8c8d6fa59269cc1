use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::errors::AppError;

// ============ Core Domain Models ============

/// A raw lead record: named behavioral signals with integer values.
///
/// The map is order-independent; ordering only becomes significant once the
/// lead is vectorized against the feature schema. Keys beyond the required
/// feature set are carried through and echoed back in scoring responses.
pub type Lead = BTreeMap<String, i64>;

/// A lead together with its observed conversion outcome.
///
/// Field order matches the feature schema in `features::FEATURE_COLUMNS`;
/// the serde renames match the training CSV column headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    /// Number of marketing emails the lead opened.
    #[serde(rename = "Email_Opens")]
    pub email_opens: i64,
    /// Number of website visits.
    #[serde(rename = "Website_Visits")]
    pub website_visits: i64,
    /// Total time spent on the website, in seconds.
    #[serde(rename = "Time_Spent_Sec")]
    pub time_spent_sec: i64,
    /// Whether a product demo was requested (0/1).
    #[serde(rename = "Demo_Requested")]
    pub demo_requested: i64,
    /// Observed conversion outcome (0/1).
    #[serde(rename = "Converted")]
    pub converted: i64,
}

impl LabeledSample {
    /// Returns the sample's features as a `Lead` mapping.
    pub fn lead(&self) -> Lead {
        let mut lead = Lead::new();
        lead.insert("Email_Opens".to_string(), self.email_opens);
        lead.insert("Website_Visits".to_string(), self.website_visits);
        lead.insert("Time_Spent_Sec".to_string(), self.time_spent_sec);
        lead.insert("Demo_Requested".to_string(), self.demo_requested);
        lead
    }
}

/// Outcome of scoring a single lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Conversion probability as a 0-100 percentage, rounded to 2 decimals.
    pub conversion_probability: f64,
    /// Tier category derived from the probability.
    pub category: String,
    /// Recommended next action for this tier.
    pub recommendation: String,
    /// Echo of the lead data that was scored.
    pub raw_data_processed: Lead,
}

// ============ API Request/Response Models ============

/// Response envelope for the lead scoring endpoint.
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    /// Whether the operation was successful.
    pub success: bool,
    /// The scoring result.
    pub prediction: PredictionResult,
}

/// Metadata of the active conversion model, safe to expose to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Unique identifier of the trained artifact.
    pub model_id: Uuid,
    /// Feature schema version the model was trained against.
    pub schema_version: u32,
    /// Ordered feature column names.
    pub feature_columns: Vec<String>,
    /// Accuracy on the held-out partition at training time.
    pub holdout_accuracy: f64,
    /// When the model was trained.
    pub trained_at: DateTime<Utc>,
}

/// Response payload for the retrain endpoint.
#[derive(Debug, Serialize)]
pub struct RetrainResponse {
    /// Whether retraining succeeded.
    pub success: bool,
    /// Held-out accuracy of the freshly trained model.
    pub accuracy: f64,
    /// Metadata of the model now serving.
    pub model: ModelInfo,
}

// ============ Input Coercion ============

/// Builds a `Lead` from a raw JSON object, coercing each value to an integer.
///
/// Accepts integer numbers, booleans (encoded as 0/1), and strings holding an
/// integer. Any other value is a client error naming the offending key. Keys
/// are not filtered here; presence of the required features is checked at
/// vectorization time so the error can name the missing feature exactly.
pub fn lead_from_json(raw: &serde_json::Map<String, Value>) -> Result<Lead, AppError> {
    let mut lead = Lead::new();
    for (key, value) in raw {
        let coerced = match value {
            Value::Number(n) => n.as_i64(),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let coerced = coerced.ok_or_else(|| {
            AppError::BadRequest(format!(
                "Lead feature '{}' must be an integer value, got: {}",
                key, value
            ))
        })?;
        lead.insert(key.clone(), coerced);
    }
    Ok(lead)
}
