use serde::Deserialize;
use std::path::PathBuf;

use crate::synthetic::DEFAULT_SAMPLE_COUNT;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub model_path: PathBuf,
    pub training_data_path: PathBuf,
    pub synthetic_samples: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "data/lead_predictor_model.json".to_string())
                .into(),
            training_data_path: std::env::var("TRAINING_DATA_PATH")
                .unwrap_or_else(|_| "data/lead_data.csv".to_string())
                .into(),
            synthetic_samples: std::env::var("SYNTHETIC_SAMPLES")
                .unwrap_or_else(|_| DEFAULT_SAMPLE_COUNT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SYNTHETIC_SAMPLES must be a positive number"))?,
        };

        if config.model_path.as_os_str().is_empty() {
            anyhow::bail!("MODEL_PATH cannot be empty");
        }
        if config.training_data_path.as_os_str().is_empty() {
            anyhow::bail!("TRAINING_DATA_PATH cannot be empty");
        }
        if config.synthetic_samples == 0 {
            anyhow::bail!("SYNTHETIC_SAMPLES must be a positive number");
        }

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Model artifact path: {}", config.model_path.display());
        tracing::debug!(
            "Training data path: {}",
            config.training_data_path.display()
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
