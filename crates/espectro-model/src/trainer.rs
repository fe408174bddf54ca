//! Training orchestration: label mapping, embedding reuse, stratified fit.

use std::path::Path;

use ndarray::Array2;
use tracing::info;

use espectro_ai::TextEmbedder;
use espectro_core::{ClassMap, Config, Speech};
use espectro_store::{CacheMode, EmbeddingCache, save_classifier};

use crate::metrics::Metrics;
use crate::net::{MlpClassifier, TrainOptions};
use crate::split::stratified_split;
use crate::ModelError;

/// Trains the political bias classifier from a labeled speech corpus.
///
/// Owns the encoder and the (at most one) fitted classifier for the duration
/// of a run; persistence goes through the classifier store.
pub struct Trainer<E> {
    class_map: ClassMap,
    cache: EmbeddingCache,
    embedder: E,
    random_state: u64,
    test_fraction: f64,
    train_options: TrainOptions,
    classifier: Option<MlpClassifier>,
}

impl<E: TextEmbedder> Trainer<E> {
    pub fn new(config: &Config, embedder: E) -> Self {
        let model = &config.model;
        let mode = if model.validate_cache {
            CacheMode::Fingerprint
        } else {
            CacheMode::Convention
        };

        Self {
            class_map: config.class_map(),
            cache: EmbeddingCache::new(
                config.embeddings_path(),
                model.reuse_embeddings,
                mode,
                model.batch_size,
            ),
            embedder,
            random_state: model.random_state,
            test_fraction: model.test_fraction,
            train_options: TrainOptions {
                hidden_units: model.hidden_units,
                max_iter: model.max_iter,
                seed: model.random_state,
                ..TrainOptions::default()
            },
            classifier: None,
        }
    }

    /// Map labels, drop unusable rows, and produce the index-aligned
    /// `(embeddings, classes)` pair.
    ///
    /// Rows are dropped when the spectrum label is absent from the mapping
    /// table or the transcript is empty — never remapped to a default class,
    /// which would corrupt the class balance. Embeddings come from the cache
    /// when reuse permits.
    pub fn prepare_data(
        &mut self,
        speeches: &[Speech],
    ) -> Result<(Array2<f32>, Vec<usize>), ModelError> {
        let mut texts: Vec<&str> = Vec::new();
        let mut classes: Vec<usize> = Vec::new();

        for speech in speeches {
            if speech.transcript.trim().is_empty() {
                continue;
            }
            if let Some(class) = self.class_map.map(&speech.spectrum) {
                texts.push(&speech.transcript);
                classes.push(class.code());
            }
        }

        if texts.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        info!(
            kept = texts.len(),
            dropped = speeches.len() - texts.len(),
            "prepared training rows"
        );

        let vectors = self.cache.get_or_compute(&texts, &mut self.embedder)?;
        debug_assert_eq!(vectors.len(), classes.len());

        let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
        let mut x = Array2::<f32>::zeros((vectors.len(), dim));
        for (i, vector) in vectors.iter().enumerate() {
            for (j, &value) in vector.iter().enumerate() {
                x[[i, j]] = value;
            }
        }

        Ok((x, classes))
    }

    /// Stratified split, seeded fit, held-out evaluation.
    ///
    /// Hitting the iteration cap is non-fatal: the best-effort classifier is
    /// kept and `Metrics::converged` is false.
    pub fn train(&mut self, x: &Array2<f32>, y: &[usize]) -> Result<Metrics, ModelError> {
        let (train_idx, test_idx) = stratified_split(y, self.test_fraction, self.random_state);
        if test_idx.is_empty() {
            // Every class is a singleton; there is nothing to hold out.
            return Err(ModelError::EmptyDataset);
        }

        let x_train = x.select(ndarray::Axis(0), &train_idx);
        let y_train: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();
        let x_test = x.select(ndarray::Axis(0), &test_idx);
        let y_test: Vec<usize> = test_idx.iter().map(|&i| y[i]).collect();

        info!(
            train = train_idx.len(),
            test = test_idx.len(),
            "fitting classifier"
        );
        let (classifier, outcome) = MlpClassifier::fit(&x_train, &y_train, 3, &self.train_options);

        let y_pred = classifier.predict(&x_test)?;
        let mut metrics = Metrics::evaluate(&y_test, &y_pred);
        metrics.converged = outcome.converged;
        metrics.n_iter = outcome.n_iter;

        info!(
            accuracy = metrics.accuracy,
            n_iter = metrics.n_iter,
            converged = metrics.converged,
            "training finished"
        );

        self.classifier = Some(classifier);
        Ok(metrics)
    }

    /// The fitted classifier, if `train` has run.
    pub fn classifier(&self) -> Option<&MlpClassifier> {
        self.classifier.as_ref()
    }

    /// Persist the fitted classifier.
    pub fn save_model(&self, path: &Path) -> Result<(), ModelError> {
        let classifier = self.classifier.as_ref().ok_or(ModelError::UntrainedModel)?;
        save_classifier(classifier, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use espectro_ai::EmbedError;
    use espectro_store::load_classifier;

    /// Deterministic embedder double: direction encodes the first letter, so
    /// classes are linearly separable.
    struct StubEmbedder {
        calls: usize,
    }

    impl StubEmbedder {
        fn new() -> Self {
            Self { calls: 0 }
        }
    }

    impl TextEmbedder for StubEmbedder {
        fn dim(&self) -> usize {
            4
        }

        fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            self.calls += 1;
            texts
                .iter()
                .map(|t| {
                    if t.trim().is_empty() {
                        return Err(EmbedError::EmptyText);
                    }
                    let jitter = (t.len() % 7) as f32 * 0.01;
                    let mut v = vec![jitter; 4];
                    match t.as_bytes()[0] {
                        b'c' => v[0] += 1.0,
                        b'd' => v[1] += 1.0,
                        _ => v[2] += 1.0,
                    }
                    Ok(v)
                })
                .collect()
        }
    }

    fn speech(transcript: &str, spectrum: &str) -> Speech {
        Speech {
            transcript: transcript.to_string(),
            spectrum: spectrum.to_string(),
        }
    }

    /// Corpus whose stub embeddings separate cleanly: transcripts starting
    /// with c/d/e belong to Centro/Direita/Esquerda.
    fn corpus(per_class: usize) -> Vec<Speech> {
        let mut speeches = Vec::new();
        for i in 0..per_class {
            speeches.push(speech(&format!("centro fala {i}"), "Centro"));
            speeches.push(speech(&format!("direita fala {i}"), "Direita"));
            speeches.push(speech(&format!("esquerda fala {i}"), "Esquerda"));
        }
        speeches
    }

    fn test_config(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.paths.models_dir = dir.path().to_path_buf();
        config.model.hidden_units = 16;
        config.model.max_iter = 1500;
        config
    }

    #[test]
    fn unmapped_rows_are_dropped_not_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(&test_config(&dir), StubEmbedder::new());

        let mut speeches = corpus(3); // 9 rows
        speeches.push(speech("discurso sem espectro", "Desconhecido"));

        let (x, y) = trainer.prepare_data(&speeches).unwrap();
        assert_eq!(x.nrows(), 9);
        assert_eq!(y.len(), 9);
    }

    #[test]
    fn empty_transcripts_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(&test_config(&dir), StubEmbedder::new());

        let mut speeches = corpus(2);
        speeches.push(speech("   ", "Centro"));

        let (x, _) = trainer.prepare_data(&speeches).unwrap();
        assert_eq!(x.nrows(), 6);
    }

    #[test]
    fn embeddings_stay_aligned_with_labels() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(&test_config(&dir), StubEmbedder::new());

        let (x, y) = trainer.prepare_data(&corpus(5)).unwrap();
        assert_eq!(x.nrows(), y.len());
    }

    #[test]
    fn all_rows_unmapped_is_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(&test_config(&dir), StubEmbedder::new());

        let speeches = vec![speech("fala", "Desconhecido"), speech("outra", "Unknown")];
        assert!(matches!(
            trainer.prepare_data(&speeches),
            Err(ModelError::EmptyDataset)
        ));
    }

    #[test]
    fn cache_reuse_never_touches_the_embedder() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        config.model.reuse_embeddings = true;

        let speeches = corpus(4);

        // First run populates the cache.
        let mut first = Trainer::new(&config, StubEmbedder::new());
        first.prepare_data(&speeches).unwrap();

        // Second run must not invoke the embedding provider at all.
        let mut second = Trainer::new(&config, StubEmbedder::new());
        let (x, y) = second.prepare_data(&speeches).unwrap();
        assert_eq!(x.nrows(), 12);
        assert_eq!(y.len(), 12);
        assert_eq!(second.embedder.calls, 0);
    }

    #[test]
    fn train_produces_usable_classifier_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(&test_config(&dir), StubEmbedder::new());

        let (x, y) = trainer.prepare_data(&corpus(8)).unwrap();
        let metrics = trainer.train(&x, &y).unwrap();

        assert!(metrics.accuracy > 0.9, "accuracy {}", metrics.accuracy);
        assert!(trainer.classifier().is_some());
        for row in &metrics.confusion_matrix {
            let sum: f64 = row.iter().sum();
            assert!(sum == 0.0 || (sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn save_before_train_is_untrained_model() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = Trainer::new(&test_config(&dir), StubEmbedder::new());
        let err = trainer
            .save_model(&dir.path().join("model.json"))
            .unwrap_err();
        assert!(matches!(err, ModelError::UntrainedModel));
    }

    #[test]
    fn saved_model_round_trips_identical_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let mut trainer = Trainer::new(&test_config(&dir), StubEmbedder::new());

        let (x, y) = trainer.prepare_data(&corpus(8)).unwrap();
        trainer.train(&x, &y).unwrap();

        let path = dir.path().join("model.json");
        trainer.save_model(&path).unwrap();

        let restored: MlpClassifier = load_classifier(&path).unwrap();
        let original = trainer.classifier().unwrap();
        assert_eq!(original.predict(&x).unwrap(), restored.predict(&x).unwrap());
    }
}
