use crate::errors::AppError;
use crate::features;
use crate::model::ConversionModel;
use crate::models::{Lead, PredictionResult};

/// Maps a conversion probability to a tier category and recommended action.
///
/// Thresholds are evaluated top-down with half-open intervals, first match
/// wins; boundary values (exactly 0.75, 0.50, 0.25) belong to the higher
/// tier. The thresholds and wording are business rules, not tunables.
pub fn classify(probability: f64) -> (&'static str, &'static str) {
    if probability >= 0.75 {
        (
            "Hot Lead (High Conversion Likelihood)",
            "Immediate phone contact; send personalized case study",
        )
    } else if probability >= 0.50 {
        (
            "Warm Lead (Moderate Conversion Likelihood)",
            "Follow-up email; schedule webinar invite",
        )
    } else if probability >= 0.25 {
        (
            "Cool Lead (Low-Medium Likelihood)",
            "Automated nurturing sequence; monitor activity",
        )
    } else {
        (
            "Cold Lead (Low Likelihood)",
            "Add to long-term newsletter; no direct outreach",
        )
    }
}

/// Rounds a percentage to 2 decimal places, half-up (away from zero).
pub fn round_percentage(percent: f64) -> f64 {
    (percent * 100.0).round() / 100.0
}

/// Scores one lead: vectorize, predict, classify.
///
/// The single operation the serving boundary calls. Pure with respect to its
/// inputs; the probability is reported as a 0-100 percentage rounded to 2
/// decimals, alongside the echoed raw input. Upstream failures surface as
/// `AppError` values for the boundary to map to transport status codes.
pub fn score_lead(model: &ConversionModel, lead: &Lead) -> Result<PredictionResult, AppError> {
    let vector = features::vectorize(lead)?;
    let probability = model.predict_probability(&vector);
    let (category, recommendation) = classify(probability);

    Ok(PredictionResult {
        conversion_probability: round_percentage(probability * 100.0),
        category: category.to_string(),
        recommendation: recommendation.to_string(),
        raw_data_processed: lead.clone(),
    })
}
