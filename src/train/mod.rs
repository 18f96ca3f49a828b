//! Training and evaluation of the classifier.
//!
//! Loss is binary cross-entropy averaged over every relation output of every
//! example:
//! - label 1: loss = -log(p)
//! - label 0: loss = -log(1 - p)

mod metrics;
mod trainer;

pub use metrics::{accuracy, binary_cross_entropy, ensure_finite};
pub use trainer::{EpochMetrics, Evaluation, History, TrainConfig, Trainer};
