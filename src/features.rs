use crate::errors::AppError;
use crate::models::Lead;

/// Version of the feature schema below.
///
/// Persisted inside every model artifact; load fails fast on a mismatch so a
/// stale artifact can never silently mis-score leads against a reordered or
/// resized feature set.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Ordered feature columns shared by the trainer and the scorer.
///
/// This ordering is a contract: the trainer fits weights against vectors in
/// this order and the scorer builds vectors in this order. It must only ever
/// change together with `FEATURE_SCHEMA_VERSION`.
pub const FEATURE_COLUMNS: [&str; 4] = [
    "Email_Opens",
    "Website_Visits",
    "Time_Spent_Sec",
    "Demo_Requested",
];

/// Fixed-order numeric encoding of a lead, consumed by the classifier.
pub type FeatureVector = [f64; FEATURE_COLUMNS.len()];

/// Maps a raw lead record into an ordered feature vector.
///
/// Fails with `AppError::MissingFeature` naming the first absent required
/// key. Values are passed through as-is beyond the integer representation
/// the `Lead` type already guarantees; negative or out-of-range magnitudes
/// are accepted (the model was trained on a bounded synthetic range but no
/// runtime bound is enforced).
pub fn vectorize(lead: &Lead) -> Result<FeatureVector, AppError> {
    let mut vector: FeatureVector = [0.0; FEATURE_COLUMNS.len()];
    for (slot, column) in vector.iter_mut().zip(FEATURE_COLUMNS.iter()) {
        let value = lead
            .get(*column)
            .ok_or_else(|| AppError::MissingFeature((*column).to_string()))?;
        *slot = *value as f64;
    }
    Ok(vector)
}
