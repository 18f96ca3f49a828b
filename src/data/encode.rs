//! Turning triples into model inputs.

use super::{RelationSet, Triple, Vocabulary};
use crate::error::Result;

/// A triple ready for the classifier: entity indices plus a one-hot label.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedExample {
    pub head: usize,
    pub tail: usize,
    /// One-hot over the relation set
    pub label: Vec<f32>,
}

/// Encodes triples against a frozen vocabulary and relation set.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a> {
    vocab: &'a Vocabulary,
    relations: &'a RelationSet,
}

impl<'a> Encoder<'a> {
    pub fn new(vocab: &'a Vocabulary, relations: &'a RelationSet) -> Self {
        Self { vocab, relations }
    }

    /// Encode one triple. Unknown entities or relations are errors, never a
    /// placeholder index.
    pub fn encode(&self, triple: &Triple) -> Result<EncodedExample> {
        Ok(EncodedExample {
            head: self.vocab.index_of(&triple.head)?,
            tail: self.vocab.index_of(&triple.tail)?,
            label: self.relations.one_hot(&triple.relation)?,
        })
    }

    pub fn encode_all(&self, triples: &[Triple]) -> Result<Vec<EncodedExample>> {
        triples.iter().map(|t| self.encode(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KinbagError;

    #[test]
    fn test_encode_reference_example() {
        let triples = vec![Triple::new("a", "r1", "b"), Triple::new("b", "r2", "c")];
        let vocab = Vocabulary::from_triples(&triples);
        let relations = RelationSet::from_triples(&triples);

        assert_eq!(vocab.index_of("a").unwrap(), 1);
        assert_eq!(vocab.index_of("b").unwrap(), 2);
        assert_eq!(vocab.index_of("c").unwrap(), 3);

        let encoder = Encoder::new(&vocab, &relations);
        let ex = encoder.encode(&Triple::new("a", "r1", "b")).unwrap();
        assert_eq!(
            ex,
            EncodedExample {
                head: 1,
                tail: 2,
                label: vec![1.0, 0.0],
            }
        );
    }

    #[test]
    fn test_labels_are_one_hot() {
        let triples = vec![
            Triple::new("x", "parent", "y"),
            Triple::new("y", "child", "x"),
            Triple::new("z", "sibling", "y"),
            Triple::new("Z", "parent", "X"),
        ];
        let vocab = Vocabulary::from_triples(&triples);
        let relations = RelationSet::from_triples(&triples);
        let encoded = Encoder::new(&vocab, &relations).encode_all(&triples).unwrap();

        for ex in &encoded {
            let sum: f32 = ex.label.iter().sum();
            assert_eq!(sum, 1.0);
            assert_eq!(ex.label.len(), 3);
        }
        // Case-insensitive lookup maps "Z"/"X" onto the same indices as "z"/"x"
        assert_eq!(encoded[3].head, encoded[2].head);
        assert_eq!(encoded[3].tail, encoded[1].tail);
    }

    #[test]
    fn test_encoder_vocabulary_desync_is_an_error() {
        let known = vec![Triple::new("a", "r", "b")];
        let vocab = Vocabulary::from_triples(&known);
        let relations = RelationSet::from_triples(&known);
        let encoder = Encoder::new(&vocab, &relations);

        assert!(matches!(
            encoder.encode(&Triple::new("a", "r", "zed")),
            Err(KinbagError::MissingEntity(_))
        ));
        assert!(matches!(
            encoder.encode(&Triple::new("a", "q", "b")),
            Err(KinbagError::MissingRelation(_))
        ));
    }
}
