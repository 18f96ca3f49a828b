//! The bag-of-entities relation classifier.
//!
//! A FastText-style model: look up the head and tail embeddings, average them,
//! project to one logit per relation and squash each logit independently.
//! Averaging makes the score symmetric in head and tail; that is a property
//! of the model, not an accident.

mod classifier;
mod summary;

pub use classifier::BagOfEntities;
pub use summary::{LayerSummary, ModelSummary};
