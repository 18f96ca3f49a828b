//! Mini-batch training loop.
//!
//! Every pass reshuffles the training set, steps Adam once per batch and then
//! scores the validation split without touching the weights.

use candle_core::{Device, Tensor};
use candle_nn::optim::{AdamW, Optimizer, ParamsAdamW};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::metrics::{accuracy, binary_cross_entropy, ensure_finite};
use crate::data::EncodedExample;
use crate::error::{KinbagError, Result};
use crate::model::BagOfEntities;

/// Training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Passes over the training set (default: 10).
    pub epochs: usize,
    /// Examples per optimizer step (default: 32).
    pub batch_size: usize,
    /// Adam learning rate (default: 0.001).
    pub learning_rate: f64,
    /// Probability at or above which an output counts as predicted (default: 0.5).
    pub threshold: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            learning_rate: 0.001,
            threshold: 0.5,
        }
    }
}

impl TrainConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(KinbagError::Config("batch_size must be positive".to_string()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(KinbagError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Loss and accuracy over a set of examples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub loss: f32,
    /// Fraction of individual relation outputs predicted correctly
    pub accuracy: f32,
}

/// Metrics recorded at the end of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f32,
    /// `None` when there is no validation split
    pub validation: Option<Evaluation>,
}

/// Per-pass metrics for a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct History {
    pub epochs: Vec<EpochMetrics>,
}

impl History {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Trains a [`BagOfEntities`] in place.
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run `epochs` passes over `train`, validating on `validation` after each.
    ///
    /// Fails on the first non-finite batch loss or out-of-range index; the
    /// model is left partially trained and should be discarded.
    pub fn fit<R: Rng + ?Sized>(
        &self,
        model: &mut BagOfEntities,
        train: &[EncodedExample],
        validation: &[EncodedExample],
        rng: &mut R,
    ) -> Result<History> {
        self.config.validate()?;
        if train.is_empty() {
            return Err(KinbagError::EmptyDataset("training split is empty"));
        }

        // Adam: AdamW without decoupled weight decay
        let params = ParamsAdamW {
            lr: self.config.learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            weight_decay: 0.0,
        };
        let mut optimizer = AdamW::new(model.vars(), params)?;

        let mut order: Vec<usize> = (0..train.len()).collect();
        let mut history = History::default();

        for epoch in 0..self.config.epochs {
            order.shuffle(rng);

            let mut loss_sum = 0.0f64;
            for (batch, chunk) in order.chunks(self.config.batch_size).enumerate() {
                let examples: Vec<&EncodedExample> = chunk.iter().map(|&i| &train[i]).collect();
                let (heads, tails, targets) = batch_tensors(&examples, model.num_relations(), model.device())?;

                let probs = model.forward(&heads, &tails)?;
                let loss = binary_cross_entropy(&probs, &targets)?;
                let value = ensure_finite(&loss, epoch, batch)?;

                optimizer.backward_step(&loss)?;
                loss_sum += value as f64 * chunk.len() as f64;
            }

            let train_loss = (loss_sum / train.len() as f64) as f32;
            let validation = if validation.is_empty() {
                None
            } else {
                Some(self.evaluate(model, validation)?)
            };

            tracing::info!(
                epoch = epoch + 1,
                train_loss,
                val_loss = ?validation.map(|v| v.loss),
                val_accuracy = ?validation.map(|v| v.accuracy),
                "epoch finished"
            );

            history.epochs.push(EpochMetrics {
                epoch: epoch + 1,
                train_loss,
                validation,
            });
        }

        Ok(history)
    }

    /// Loss and accuracy over `examples`, batched, without updating weights.
    pub fn evaluate(&self, model: &BagOfEntities, examples: &[EncodedExample]) -> Result<Evaluation> {
        self.config.validate()?;
        if examples.is_empty() {
            return Err(KinbagError::EmptyDataset("nothing to evaluate"));
        }

        let mut loss_sum = 0.0f64;
        let mut correct = 0usize;
        let mut total = 0usize;

        for chunk in examples.chunks(self.config.batch_size) {
            let refs: Vec<&EncodedExample> = chunk.iter().collect();
            let (heads, tails, targets) = batch_tensors(&refs, model.num_relations(), model.device())?;

            let probs = model.forward(&heads, &tails)?;
            let loss = binary_cross_entropy(&probs, &targets)?.to_scalar::<f32>()?;
            let (c, n) = accuracy(&probs, &targets, self.config.threshold)?;

            loss_sum += loss as f64 * chunk.len() as f64;
            correct += c;
            total += n;
        }

        Ok(Evaluation {
            loss: (loss_sum / examples.len() as f64) as f32,
            accuracy: correct as f32 / total as f32,
        })
    }
}

/// Split a batch into head indices, tail indices and a [batch, relations]
/// target tensor.
fn batch_tensors(
    examples: &[&EncodedExample],
    num_relations: usize,
    device: &Device,
) -> Result<(Vec<usize>, Vec<usize>, Tensor)> {
    let mut heads = Vec::with_capacity(examples.len());
    let mut tails = Vec::with_capacity(examples.len());
    let mut labels = Vec::with_capacity(examples.len() * num_relations);

    for ex in examples {
        if ex.label.len() != num_relations {
            return Err(KinbagError::ShapeMismatch {
                expected: format!("label of length {}", num_relations),
                got: format!("label of length {}", ex.label.len()),
            });
        }
        heads.push(ex.head);
        tails.push(ex.tail);
        labels.extend_from_slice(&ex.label);
    }

    let targets = Tensor::from_vec(labels, (examples.len(), num_relations), device)?;
    Ok((heads, tails, targets))
}
