//! Dataset handling: loading triples, building vocabularies, encoding,
//! oversampling and splitting.
//!
//! The stages are pure functions over explicit value objects. Anything
//! random takes a `&mut R: Rng` so a single seeded generator drives a run.

mod augment;
mod encode;
mod split;
mod triples;
mod vocab;

pub use augment::{Oversampled, Oversampler, SamplingPool};
pub use encode::{EncodedExample, Encoder};
pub use split::DatasetSplit;
pub use triples::{load_triples, parse_triples, Triple};
pub use vocab::{RelationSet, Vocabulary};
