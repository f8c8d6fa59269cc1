use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::AppError;
use crate::models::LabeledSample;
use crate::synthetic;

/// Durable storage for the labeled training dataset.
///
/// A CSV file with one row per `LabeledSample`: the four feature columns in
/// schema order plus `Converted`. Absence of the file is recoverable — the
/// synthetic generator materializes a dataset so bootstrap training always
/// has reproducible inputs.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the dataset file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted dataset, if any. `Ok(None)` when the file is
    /// missing; malformed rows are an error, never silently skipped.
    pub fn load(&self) -> Result<Option<Vec<LabeledSample>>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| {
            AppError::Storage(format!(
                "failed to open training data {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut samples = Vec::new();
        for record in reader.deserialize() {
            let sample: LabeledSample = record.map_err(|e| {
                AppError::Storage(format!(
                    "malformed row in training data {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
            samples.push(sample);
        }

        tracing::info!(
            "Loaded {} training samples from {}",
            samples.len(),
            self.path.display()
        );
        Ok(Some(samples))
    }

    /// Persists the dataset, overwriting any previous file.
    pub fn save(&self, samples: &[LabeledSample]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    AppError::Storage(format!(
                        "failed to create dataset directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| {
            AppError::Storage(format!(
                "failed to create training data {}: {}",
                self.path.display(),
                e
            ))
        })?;
        for sample in samples {
            writer.serialize(sample)?;
        }
        writer
            .flush()
            .map_err(|e| AppError::Storage(format!("failed to flush training data: {}", e)))?;

        tracing::info!(
            "Persisted {} training samples to {}",
            samples.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Loads the dataset, materializing and persisting a synthetic one when
    /// none exists yet. The generated file makes later retraining runs
    /// reproducible from the same data.
    pub fn load_or_generate(&self, sample_count: usize) -> Result<Vec<LabeledSample>, AppError> {
        if let Some(samples) = self.load()? {
            return Ok(samples);
        }

        tracing::info!(
            "No training data at {}, generating {} synthetic samples",
            self.path.display(),
            sample_count
        );
        let samples = synthetic::generate_samples(sample_count);
        self.save(&samples)?;
        Ok(samples)
    }
}
