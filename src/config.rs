//! Run configuration.
//!
//! Defaults reproduce the reference run. A JSON document can override any
//! subset of fields; missing fields keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::Oversampler;
use crate::error::{KinbagError, Result};
use crate::train::TrainConfig;
use crate::viz::Tsne;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Column separator in the triples file (default: tab).
    pub delimiter: char,
    /// Embedding dimension (default: 200).
    pub embedding_dim: usize,
    pub oversample: Oversampler,
    /// Share of the augmented set held out for testing (default: 0.1).
    pub test_fraction: f64,
    /// Share of the remainder held out for validation (default: 0.1).
    pub validation_fraction: f64,
    pub train: TrainConfig,
    pub tsne: Tsne,
    /// Seed for augmentation, splitting, initialisation and batch order (default: 42).
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            delimiter: '\t',
            embedding_dim: 200,
            oversample: Oversampler::default(),
            test_fraction: 0.1,
            validation_fraction: 0.1,
            train: TrainConfig::default(),
            tsne: Tsne::default(),
            seed: 42,
        }
    }
}

impl RunConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_train(mut self, train: TrainConfig) -> Self {
        self.train = train;
        self
    }

    pub fn with_oversample(mut self, oversample: Oversampler) -> Self {
        self.oversample = oversample;
        self
    }

    pub fn with_tsne(mut self, tsne: Tsne) -> Self {
        self.tsne = tsne;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(KinbagError::Config("embedding_dim must be positive".to_string()));
        }
        if self.tsne.perplexity <= 0.0 {
            return Err(KinbagError::Config(format!(
                "tsne perplexity must be positive, got {}",
                self.tsne.perplexity
            )));
        }
        Ok(())
    }
}
