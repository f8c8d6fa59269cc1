//! Utility to train the conversion model from the persisted training dataset
//! and publish the artifact, generating synthetic data when none exists.

use lead_score_api::config::Config;
use lead_score_api::dataset::DatasetStore;
use lead_score_api::model::ModelStore;
use lead_score_api::trainer::Trainer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the training utility.
///
/// Loads (or bootstraps) the training dataset, fits the model, persists the
/// artifact, and prints the held-out accuracy.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_score_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let dataset = DatasetStore::new(&config.training_data_path);
    let samples = dataset
        .load_or_generate(config.synthetic_samples)
        .map_err(|e| anyhow::anyhow!("failed to load training data: {}", e))?;
    println!("Training on {} samples...", samples.len());

    let trainer = Trainer::new(ModelStore::new(&config.model_path));
    let (model, accuracy) = trainer
        .train(&samples)
        .map_err(|e| anyhow::anyhow!("training failed: {}", e))?;

    println!("Model Accuracy: {:.2}", accuracy);
    println!(
        "Model {} trained and saved to {}",
        model.model_id,
        config.model_path.display()
    );

    Ok(())
}
