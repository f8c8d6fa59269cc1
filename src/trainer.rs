use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use uuid::Uuid;

use crate::config::Config;
use crate::dataset::DatasetStore;
use crate::errors::AppError;
use crate::features::{self, FeatureVector, FEATURE_COLUMNS, FEATURE_SCHEMA_VERSION};
use crate::model::{ConversionModel, ModelStore};
use crate::models::LabeledSample;

/// Seed for the train/held-out shuffle. Fixed so repeated runs on identical
/// data reproduce identical splits and identical fitted parameters.
const SPLIT_SEED: u64 = 42;

/// Fraction of the dataset held out for accuracy measurement.
const HOLDOUT_FRACTION: f64 = 0.2;

/// Full-batch gradient descent schedule for the logistic fit.
const EPOCHS: usize = 500;
const LEARNING_RATE: f64 = 0.1;

/// Below this the split would leave partitions too small to mean anything.
const MIN_SAMPLES: usize = 10;

/// Fits conversion models and persists the resulting artifacts.
pub struct Trainer {
    store: ModelStore,
}

impl Trainer {
    pub fn new(store: ModelStore) -> Self {
        Self { store }
    }

    /// Trains a model on the given dataset and persists the artifact.
    ///
    /// Persistence happens only after a successful fit, so a failed training
    /// run never corrupts a previously persisted artifact. Returns the
    /// in-memory model together with its held-out accuracy so callers can log
    /// or assert on model quality without re-loading from storage.
    pub fn train(&self, samples: &[LabeledSample]) -> Result<(ConversionModel, f64), AppError> {
        let model = fit(samples)?;
        let accuracy = model.holdout_accuracy;
        self.store.save(&model)?;
        tracing::info!(
            "Trained conversion model {} on {} samples, held-out accuracy {:.2}",
            model.model_id,
            samples.len(),
            accuracy
        );
        Ok((model, accuracy))
    }
}

/// Loads the persisted model, or bootstraps one when no artifact exists.
///
/// This is the explicit initialization step invoked by the process entry
/// point: artifact present and valid → load; absent → load-or-generate the
/// training dataset and train; corrupt → error, fatal to startup.
pub fn load_or_train(config: &Config) -> Result<ConversionModel, AppError> {
    let store = ModelStore::new(&config.model_path);
    if let Some(model) = store.load()? {
        return Ok(model);
    }

    tracing::warn!(
        "No model artifact at {}, running bootstrap training",
        config.model_path.display()
    );
    let dataset = DatasetStore::new(&config.training_data_path);
    let samples = dataset.load_or_generate(config.synthetic_samples)?;
    let (model, accuracy) = Trainer::new(store).train(&samples)?;
    tracing::info!("Bootstrap training complete, accuracy {:.2}", accuracy);
    Ok(model)
}

/// Fits a logistic classifier over the fixed feature schema.
///
/// Deterministic: seeded 80/20 shuffle split, then full-batch gradient
/// descent on z-score standardized features. The scaling is folded back into
/// the returned weights so the artifact applies directly to raw feature
/// vectors. Held-out accuracy is the fraction of exact label matches at the
/// 0.5 probability threshold.
fn fit(samples: &[LabeledSample]) -> Result<ConversionModel, AppError> {
    if samples.len() < MIN_SAMPLES {
        return Err(AppError::Training(format!(
            "dataset has {} samples, need at least {}",
            samples.len(),
            MIN_SAMPLES
        )));
    }

    let mut vectors = Vec::with_capacity(samples.len());
    let mut labels = Vec::with_capacity(samples.len());
    for sample in samples {
        if sample.converted != 0 && sample.converted != 1 {
            return Err(AppError::Training(format!(
                "label Converted must be 0 or 1, got {}",
                sample.converted
            )));
        }
        vectors.push(features::vectorize(&sample.lead())?);
        labels.push(sample.converted as f64);
    }

    // Reproducible shuffle split
    let mut indices: Vec<usize> = (0..samples.len()).collect();
    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
    indices.shuffle(&mut rng);

    let holdout_len = ((samples.len() as f64 * HOLDOUT_FRACTION) as usize).max(1);
    let (holdout_idx, train_idx) = indices.split_at(holdout_len);

    let positives = train_idx.iter().filter(|&&i| labels[i] == 1.0).count();
    if positives == 0 || positives == train_idx.len() {
        return Err(AppError::Training(
            "degenerate label distribution: training partition contains a single class"
                .to_string(),
        ));
    }

    // Standardize features on the training partition
    let dim = FEATURE_COLUMNS.len();
    let m = train_idx.len() as f64;
    let mut means = vec![0.0; dim];
    for &i in train_idx {
        for (mean, x) in means.iter_mut().zip(vectors[i].iter()) {
            *mean += x;
        }
    }
    for mean in means.iter_mut() {
        *mean /= m;
    }
    let mut stds = vec![0.0; dim];
    for &i in train_idx {
        for ((std, x), mean) in stds.iter_mut().zip(vectors[i].iter()).zip(means.iter()) {
            *std += (x - mean) * (x - mean);
        }
    }
    for std in stds.iter_mut() {
        *std = (*std / m).sqrt();
        // Constant columns carry no signal; leave them unscaled
        if *std == 0.0 {
            *std = 1.0;
        }
    }

    let scale = |v: &FeatureVector| -> Vec<f64> {
        v.iter()
            .zip(means.iter())
            .zip(stds.iter())
            .map(|((x, mean), std)| (x - mean) / std)
            .collect()
    };

    // Full-batch gradient descent on the logistic loss
    let mut weights = vec![0.0; dim];
    let mut bias = 0.0;
    for _ in 0..EPOCHS {
        let mut grad_w = vec![0.0; dim];
        let mut grad_b = 0.0;
        for &i in train_idx {
            let x = scale(&vectors[i]);
            let linear = bias
                + x.iter()
                    .zip(weights.iter())
                    .map(|(xj, wj)| xj * wj)
                    .sum::<f64>();
            let predicted = 1.0 / (1.0 + (-linear).exp());
            let residual = predicted - labels[i];
            for (g, xj) in grad_w.iter_mut().zip(x.iter()) {
                *g += residual * xj;
            }
            grad_b += residual;
        }
        for (w, g) in weights.iter_mut().zip(grad_w.iter()) {
            *w -= LEARNING_RATE * g / m;
        }
        bias -= LEARNING_RATE * grad_b / m;
    }

    if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
        return Err(AppError::Training(
            "fit diverged to non-finite parameters".to_string(),
        ));
    }

    // Fold the standardization back into raw-feature weights
    let mut raw_weights = vec![0.0; dim];
    let mut raw_bias = bias;
    for j in 0..dim {
        raw_weights[j] = weights[j] / stds[j];
        raw_bias -= weights[j] * means[j] / stds[j];
    }

    let mut model = ConversionModel {
        model_id: Uuid::new_v4(),
        schema_version: FEATURE_SCHEMA_VERSION,
        feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        weights: raw_weights,
        bias: raw_bias,
        holdout_accuracy: 0.0,
        trained_at: Utc::now(),
    };

    let correct = holdout_idx
        .iter()
        .filter(|&&i| {
            let predicted = model.predict_probability(&vectors[i]) >= 0.5;
            predicted == (labels[i] == 1.0)
        })
        .count();
    model.holdout_accuracy = correct as f64 / holdout_len as f64;

    Ok(model)
}
