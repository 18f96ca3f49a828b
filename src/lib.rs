//! kinbag: a bag-of-entities relation classifier for small knowledge graphs.
//!
//! Each `(head, relation, tail)` fact becomes a training example whose input
//! is the pair of entities and whose target is a one-hot vector over
//! relations. The model averages the two entity embeddings and scores every
//! relation independently with a sigmoid, FastText style.
//!
//! # Pipeline
//!
//! 1. [`data::load_triples`] reads a delimited file
//! 2. [`data::Vocabulary`] / [`data::RelationSet`] index entities and relations
//! 3. [`data::Oversampler`] enlarges the set, [`data::DatasetSplit`] partitions it
//! 4. [`train::Trainer`] fits a [`model::BagOfEntities`] with Adam
//! 5. [`viz::Tsne`] projects the learned embeddings for [`viz::render_svg`]
//!
//! # Known property
//!
//! Averaging makes `score(h, t) == score(t, h)`: the model cannot tell
//! `mother(ann, ben)` from `mother(ben, ann)`.

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod train;
pub mod viz;

pub use config::RunConfig;
pub use data::{DatasetSplit, EncodedExample, Encoder, Oversampler, RelationSet, SamplingPool, Triple, Vocabulary};
pub use error::{KinbagError, Result};
pub use model::{BagOfEntities, ModelSummary};
pub use pipeline::{run, run_triples, RunReport};
pub use train::{EpochMetrics, Evaluation, History, TrainConfig, Trainer};
pub use viz::{render_svg, Projection, Tsne};
