use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::LabeledSample;

/// Seed for the synthetic lead generator. Fixed so the bootstrap dataset is
/// identical across runs and the resulting model artifacts are reproducible.
pub const SYNTHETIC_SEED: u64 = 42;

/// Default number of synthetic samples for bootstrap training.
pub const DEFAULT_SAMPLE_COUNT: usize = 500;

// Ground-truth generating process: conversion likelihood rises with email
// opens, website visits, time on site, and a requested demo.
const TRUE_WEIGHTS: [f64; 4] = [0.08, 0.12, 0.01, 1.5];
const TRUE_BIAS: f64 = -7.5;

/// Generates a deterministic batch of simulated labeled leads.
///
/// Behavioral signals are drawn over bounded ranges (opens 0-49, visits 0-29,
/// time on site 5-599s, demo requested ~20% of leads) and labeled by a
/// Bernoulli draw on a logistic function of the signals, so the label
/// genuinely depends on the features the classifier will see.
pub fn generate_samples(count: usize) -> Vec<LabeledSample> {
    let mut rng = StdRng::seed_from_u64(SYNTHETIC_SEED);
    let mut samples = Vec::with_capacity(count);

    for _ in 0..count {
        let email_opens = rng.random_range(0..50);
        let website_visits = rng.random_range(0..30);
        let time_spent_sec = rng.random_range(5..600);
        let demo_requested = i64::from(rng.random_bool(0.2));

        let linear = TRUE_BIAS
            + TRUE_WEIGHTS[0] * email_opens as f64
            + TRUE_WEIGHTS[1] * website_visits as f64
            + TRUE_WEIGHTS[2] * time_spent_sec as f64
            + TRUE_WEIGHTS[3] * demo_requested as f64;
        let conversion_probability = 1.0 / (1.0 + (-linear).exp());
        let converted = i64::from(rng.random_bool(conversion_probability));

        samples.push(LabeledSample {
            email_opens,
            website_visits,
            time_spent_sec,
            demo_requested,
            converted,
        });
    }

    samples
}
