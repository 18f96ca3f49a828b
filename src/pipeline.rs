//! End-to-end run: triples in, trained model and projection out.
//!
//! One `ChaCha8Rng` seeded from the config drives every random step, in a
//! fixed order: oversampling, splitting, weight initialisation, batch order.
//! The t-SNE step seeds its own generator from `config.tsne.seed`.

use std::path::Path;

use candle_core::Device;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::RunConfig;
use crate::data::{load_triples, DatasetSplit, Encoder, RelationSet, Triple, Vocabulary};
use crate::error::{KinbagError, Result};
use crate::model::BagOfEntities;
use crate::train::{Evaluation, History, Trainer};
use crate::viz::Projection;

/// Everything a run produces.
pub struct RunReport {
    pub vocabulary: Vocabulary,
    pub relations: RelationSet,
    pub model: BagOfEntities,
    pub history: History,
    /// Loss and accuracy on the held-out test split; `None` when it is empty
    pub test: Option<Evaluation>,
    pub projection: Projection,
    /// Dataset size after each oversampling iteration
    pub augmented_sizes: Vec<usize>,
    pub split_sizes: (usize, usize, usize),
}

/// Load `path` and run the whole pipeline.
pub fn run(path: impl AsRef<Path>, config: &RunConfig) -> Result<RunReport> {
    let triples = load_triples(path, config.delimiter)?;
    run_triples(&triples, config)
}

/// Run the whole pipeline on triples already in memory.
pub fn run_triples(triples: &[Triple], config: &RunConfig) -> Result<RunReport> {
    config.validate()?;
    if triples.is_empty() {
        return Err(KinbagError::EmptyDataset("no triples"));
    }

    let vocabulary = Vocabulary::from_triples(triples);
    let relations = RelationSet::from_triples(triples);
    tracing::info!(
        triples = triples.len(),
        entities = vocabulary.len(),
        relations = relations.len(),
        "built vocabulary"
    );

    let encoded = Encoder::new(&vocabulary, &relations).encode_all(triples)?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let augmented = config.oversample.oversample(&encoded, &mut rng)?;
    tracing::info!(
        original = encoded.len(),
        augmented = augmented.examples.len(),
        "augmented dataset"
    );

    let split = DatasetSplit::partition(
        augmented.examples,
        config.test_fraction,
        config.validation_fraction,
        &mut rng,
    )?;
    let split_sizes = (split.train.len(), split.validation.len(), split.test.len());

    let device = Device::Cpu;
    let mut model = BagOfEntities::new(
        vocabulary.len(),
        config.embedding_dim,
        relations.len(),
        &mut rng,
        &device,
    )?;

    let trainer = Trainer::new(config.train.clone());
    let history = trainer.fit(&mut model, &split.train, &split.validation, &mut rng)?;

    let test = if split.test.is_empty() {
        tracing::warn!("test split is empty, skipping test evaluation");
        None
    } else {
        let test = trainer.evaluate(&model, &split.test)?;
        tracing::info!(loss = test.loss, accuracy = test.accuracy, "test evaluation");
        Some(test)
    };

    let projection = config
        .tsne
        .project(&model.entity_vectors()?, &vocabulary.labels());

    Ok(RunReport {
        vocabulary,
        relations,
        model,
        history,
        test,
        projection,
        augmented_sizes: augmented.sizes,
        split_sizes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{parse_triples, Oversampler, SamplingPool};
    use crate::train::TrainConfig;
    use crate::viz::Tsne;
    use std::io::Write;

    const FAMILY: &str = "\
ann\tmother\tben
ann\tmother\tcat
ben\tbrother\tcat
cat\tsister\tben
dan\tfather\tben
dan\tfather\tcat
ann\twife\tdan
dan\thusband\tann
ben\tson\tann
cat\tdaughter\tdan
";

    fn small_config() -> RunConfig {
        RunConfig::default()
            .with_embedding_dim(8)
            .with_oversample(Oversampler::new(5, 0.3, SamplingPool::Accumulated))
            .with_train(TrainConfig::default().with_epochs(3).with_batch_size(8).with_learning_rate(0.01))
            .with_tsne(Tsne::new(2.0, 100, 23))
    }

    #[test]
    fn test_end_to_end() {
        let triples = parse_triples(FAMILY, '\t').unwrap();
        let report = run_triples(&triples, &small_config()).unwrap();

        assert_eq!(report.vocabulary.len(), 4);
        assert_eq!(report.relations.len(), 8);
        assert_eq!(report.model.rows(), 5);
        assert_eq!(report.history.epochs.len(), 3);
        assert_eq!(report.augmented_sizes.len(), 5);

        let (train, val, test) = report.split_sizes;
        assert_eq!(train + val + test, *report.augmented_sizes.last().unwrap());

        assert_eq!(report.projection.len(), 4);
        assert_eq!(report.projection.points[0].label, "ann");
        let test = report.test.unwrap();
        assert!(test.accuracy >= 0.0 && test.accuracy <= 1.0);
        assert!(report.history.epochs.iter().all(|e| e.validation.is_some()));
    }

    #[test]
    fn test_run_reproducible() {
        let triples = parse_triples(FAMILY, '\t').unwrap();
        let a = run_triples(&triples, &small_config()).unwrap();
        let b = run_triples(&triples, &small_config()).unwrap();

        assert_eq!(
            a.model.embeddings().to_vec2::<f32>().unwrap(),
            b.model.embeddings().to_vec2::<f32>().unwrap()
        );
        assert_eq!(a.projection, b.projection);
    }

    #[test]
    fn test_run_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FAMILY.as_bytes()).unwrap();
        let report = run(file.path(), &small_config()).unwrap();
        assert_eq!(report.vocabulary.len(), 4);
    }

    #[test]
    fn test_malformed_file_aborts_before_training() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ann\tmother\tben\nann mother ben\n").unwrap();
        assert!(matches!(
            run(file.path(), &small_config()),
            Err(KinbagError::MalformedInput { line: 2, .. })
        ));
    }

    #[test]
    fn test_zero_holdout_fractions_report_no_metrics() {
        let triples = parse_triples(FAMILY, '\t').unwrap();
        let mut config = small_config();
        config.test_fraction = 0.0;
        config.validation_fraction = 0.0;

        let report = run_triples(&triples, &config).unwrap();

        let (train, val, test) = report.split_sizes;
        assert_eq!((val, test), (0, 0));
        assert_eq!(train, *report.augmented_sizes.last().unwrap());
        assert_eq!(report.test, None);
        assert_eq!(report.history.epochs.len(), 3);
        assert!(report.history.epochs.iter().all(|e| e.validation.is_none()));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            run_triples(&[], &small_config()),
            Err(KinbagError::EmptyDataset(_))
        ));
    }
}
