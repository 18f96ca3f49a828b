//! Entity vocabulary and relation set.
//!
//! Both are built once from the triples and frozen. Entity indices start at 1;
//! index 0 is the reserved padding row of the embedding matrix.

use indexmap::IndexMap;

use super::Triple;
use crate::error::{KinbagError, Result};

/// Lowercased entity string -> index in `1..=len()`.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    /// Insertion order is index order: position `i` holds index `i + 1`
    entities: IndexMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary from the heads and tails of `triples`.
    ///
    /// Indices follow first appearance (head before tail, in input order), so
    /// identical input always yields identical indices.
    pub fn from_triples(triples: &[Triple]) -> Self {
        let mut entities = IndexMap::new();
        for t in triples {
            for name in [&t.head, &t.tail] {
                let key = name.to_lowercase();
                let next = entities.len() + 1;
                entities.entry(key).or_insert(next);
            }
        }
        Self { entities }
    }

    /// Look up an entity, case-insensitively.
    pub fn index_of(&self, entity: &str) -> Result<usize> {
        self.entities
            .get(&entity.to_lowercase())
            .copied()
            .ok_or_else(|| KinbagError::MissingEntity(entity.to_string()))
    }

    /// Label for an index in `1..=len()`.
    pub fn label(&self, index: usize) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.entities.get_index(index - 1).map(|(k, _)| k.as_str())
    }

    /// Labels in index order (label of index 1 first).
    pub fn labels(&self) -> Vec<&str> {
        self.entities.keys().map(|k| k.as_str()).collect()
    }

    /// Number of entities, not counting the reserved index 0.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Rows needed in an embedding matrix for this vocabulary.
    pub fn embedding_rows(&self) -> usize {
        self.entities.len() + 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entities.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Distinct relation labels in first-appearance order.
///
/// Relations are compared exactly (after trimming at load time).
#[derive(Debug, Clone, Default)]
pub struct RelationSet {
    relations: IndexMap<String, usize>,
}

impl RelationSet {
    pub fn from_triples(triples: &[Triple]) -> Self {
        let mut relations = IndexMap::new();
        for t in triples {
            let next = relations.len();
            relations.entry(t.relation.clone()).or_insert(next);
        }
        Self { relations }
    }

    /// Column of a relation in the one-hot encoding.
    pub fn position(&self, relation: &str) -> Result<usize> {
        self.relations
            .get(relation)
            .copied()
            .ok_or_else(|| KinbagError::MissingRelation(relation.to_string()))
    }

    /// One-hot indicator vector for a relation.
    pub fn one_hot(&self, relation: &str) -> Result<Vec<f32>> {
        let pos = self.position(relation)?;
        let mut v = vec![0.0f32; self.relations.len()];
        v[pos] = 1.0;
        Ok(v)
    }

    pub fn name(&self, position: usize) -> Option<&str> {
        self.relations.get_index(position).map(|(k, _)| k.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.relations.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn family() -> Vec<Triple> {
        vec![
            Triple::new("Alice", "mother", "Bob"),
            Triple::new("bob", "brother", "Carol"),
            Triple::new("Carol", "sister", "BOB"),
            Triple::new("dave", "father", "alice"),
        ]
    }

    #[test]
    fn test_every_entity_indexed_once_and_contiguous() {
        let triples = family();
        let vocab = Vocabulary::from_triples(&triples);

        assert_eq!(vocab.len(), 4);

        let indices: HashSet<usize> = vocab.iter().map(|(_, i)| i).collect();
        let expected: HashSet<usize> = (1..=vocab.len()).collect();
        assert_eq!(indices, expected);

        for t in &triples {
            let h = vocab.index_of(&t.head).unwrap();
            let tl = vocab.index_of(&t.tail).unwrap();
            assert_eq!(vocab.label(h).unwrap(), t.head.to_lowercase());
            assert_eq!(vocab.label(tl).unwrap(), t.tail.to_lowercase());
        }
    }

    #[test]
    fn test_first_appearance_order() {
        let vocab = Vocabulary::from_triples(&family());
        assert_eq!(vocab.labels(), vec!["alice", "bob", "carol", "dave"]);
        assert_eq!(vocab.index_of("ALICE").unwrap(), 1);
        assert_eq!(vocab.embedding_rows(), 5);
        assert_eq!(vocab.label(0), None);
        assert_eq!(vocab.label(5), None);
    }

    #[test]
    fn test_missing_entity() {
        let vocab = Vocabulary::from_triples(&family());
        match vocab.index_of("eve") {
            Err(KinbagError::MissingEntity(name)) => assert_eq!(name, "eve"),
            other => panic!("expected MissingEntity, got {:?}", other),
        }
    }

    #[test]
    fn test_relation_one_hot() {
        let relations = RelationSet::from_triples(&family());
        assert_eq!(relations.names(), vec!["mother", "brother", "sister", "father"]);

        let v = relations.one_hot("sister").unwrap();
        assert_eq!(v, vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(relations.name(relations.position("sister").unwrap()), Some("sister"));
        assert_eq!(relations.name(4), None);
        assert!(matches!(
            relations.one_hot("uncle"),
            Err(KinbagError::MissingRelation(_))
        ));
    }
}
