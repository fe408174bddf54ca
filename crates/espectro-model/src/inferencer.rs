//! Batched inference over scraped news text.
//!
//! Scraped web text is dirty — encoding damage, empty strings, oversized
//! documents — so prediction failures are isolated per item: one bad
//! document yields a failure slot at its position and never aborts the rest
//! of a portal's analysis.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{error, info};

use espectro_ai::TextEmbedder;
use espectro_core::{Orientation, PredictionRow};
use espectro_store::load_classifier;

use crate::net::MlpClassifier;
use crate::{InferError, ModelError};

/// Aggregate orientation distribution for one portal's texts.
///
/// Percentages are computed over the valid (successfully predicted) total
/// only; baking failures into the denominator would make the numbers sum
/// below 100 and silently mask the failure rate. The failure count is
/// reported separately.
#[derive(Debug, Clone)]
pub struct BiasDistribution {
    /// Number of texts with a valid prediction.
    pub total_texts: usize,
    /// Number of texts whose prediction failed.
    pub failed_texts: usize,
    /// Report name → percentage of valid predictions, in `[0, 100]`.
    pub percentages: BTreeMap<String, f64>,
}

/// Applies a trained classifier to unlabeled text.
///
/// Each instance loads its own classifier from the store; there is no
/// in-memory classifier sharing across processes.
#[derive(Debug)]
pub struct Inferencer<E> {
    embedder: E,
    classifier: MlpClassifier,
}

impl<E: TextEmbedder> Inferencer<E> {
    /// Load the persisted classifier from `model_path`.
    pub fn load(model_path: &Path, embedder: E) -> Result<Self, ModelError> {
        let classifier = load_classifier(model_path)?;
        Ok(Self {
            embedder,
            classifier,
        })
    }

    pub fn new(classifier: MlpClassifier, embedder: E) -> Self {
        Self {
            embedder,
            classifier,
        }
    }

    /// Predict the orientation of a single text.
    pub fn predict(&mut self, text: &str) -> Result<Orientation, InferError> {
        let embedding = self.embedder.embed(text)?;
        let class = self
            .classifier
            .predict_one(&embedding)
            .map_err(|e| InferError::Classifier(e.to_string()))?;
        Orientation::from_code(class)
            .ok_or_else(|| InferError::Classifier(format!("class index {class} out of range")))
    }

    /// Predict every text, isolating failures per item.
    ///
    /// The result is index-aligned with `texts`; a failed item carries its
    /// cause and is logged, and the batch always runs to completion.
    pub fn predict_batch(&mut self, texts: &[&str]) -> Vec<Result<Orientation, InferError>> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| {
                self.predict(text).inspect_err(|cause| {
                    error!(index, %cause, "failed to predict text");
                })
            })
            .collect()
    }

    /// Predict a batch and aggregate valid predictions into percentages.
    ///
    /// Fails with [`ModelError::NoValidPredictions`] when every text failed.
    pub fn analyze_media_bias(&mut self, texts: &[&str]) -> Result<BiasDistribution, ModelError> {
        let predictions = self.predict_batch(texts);

        let mut counts: BTreeMap<Orientation, usize> = BTreeMap::new();
        let mut valid = 0usize;
        for prediction in &predictions {
            if let Ok(orientation) = prediction {
                *counts.entry(*orientation).or_insert(0) += 1;
                valid += 1;
            }
        }

        if valid == 0 {
            return Err(ModelError::NoValidPredictions);
        }

        let percentages = counts
            .into_iter()
            .map(|(orientation, count)| {
                (
                    orientation.report_name().to_string(),
                    count as f64 / valid as f64 * 100.0,
                )
            })
            .collect();

        let distribution = BiasDistribution {
            total_texts: valid,
            failed_texts: predictions.len() - valid,
            percentages,
        };
        info!(
            total = distribution.total_texts,
            failed = distribution.failed_texts,
            "analyzed media bias"
        );
        Ok(distribution)
    }

    /// Write one CSV row per input text, including failed ones.
    ///
    /// Output rows stay positionally aligned with `texts` so failures remain
    /// auditable; a failed prediction is an empty field, never a dropped row.
    pub fn save_predictions(&mut self, texts: &[&str], path: &Path) -> Result<(), ModelError> {
        let predictions = self.predict_batch(texts);

        let mut writer = csv::Writer::from_path(path).map_err(ModelError::Csv)?;
        for (text, prediction) in texts.iter().zip(predictions) {
            writer.serialize(PredictionRow {
                text: text.to_string(),
                prediction: prediction.ok().map(|o| o.report_name().to_string()),
            })?;
        }
        writer.flush().map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), rows = texts.len(), "saved predictions");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::TrainOptions;
    use espectro_ai::EmbedError;
    use ndarray::Array2;

    /// Embedder double keyed on the first letter, mirroring the trainer
    /// tests so a fitted net predicts perfectly.
    #[derive(Debug)]
    struct StubEmbedder;

    impl TextEmbedder for StubEmbedder {
        fn dim(&self) -> usize {
            4
        }

        fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
            texts
                .iter()
                .map(|t| {
                    if t.trim().is_empty() {
                        return Err(EmbedError::EmptyText);
                    }
                    let mut v = vec![0.0f32; 4];
                    match t.as_bytes()[0] {
                        b'c' => v[0] = 1.0,
                        b'd' => v[1] = 1.0,
                        _ => v[2] = 1.0,
                    }
                    Ok(v)
                })
                .collect()
        }
    }

    /// Fit a small net on the stub embedding directions.
    fn fitted_classifier() -> MlpClassifier {
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for (class, slot) in [(0usize, 0usize), (1, 1), (2, 2)] {
            for _ in 0..6 {
                let mut v = [0.0f32; 4];
                v[slot] = 1.0;
                rows.push(v);
                y.push(class);
            }
        }
        let x = Array2::from_shape_fn((rows.len(), 4), |(i, j)| rows[i][j]);
        let options = TrainOptions {
            hidden_units: 8,
            max_iter: 1500,
            ..TrainOptions::default()
        };
        let (net, outcome) = MlpClassifier::fit(&x, &y, 3, &options);
        assert!(outcome.converged);
        net
    }

    fn inferencer() -> Inferencer<StubEmbedder> {
        Inferencer::new(fitted_classifier(), StubEmbedder)
    }

    #[test]
    fn single_prediction_maps_to_orientation() {
        let mut inf = inferencer();
        assert_eq!(inf.predict("centro texto").unwrap(), Orientation::Center);
        assert_eq!(inf.predict("direita texto").unwrap(), Orientation::Right);
        assert_eq!(inf.predict("esquerda texto").unwrap(), Orientation::Left);
    }

    #[test]
    fn batch_isolates_one_failure_at_its_position() {
        let mut inf = inferencer();
        let texts = ["centro a", "direita b", "", "esquerda c", "centro d"];
        let results = inf.predict_batch(&texts);

        assert_eq!(results.len(), 5);
        let failures: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_err())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(failures, vec![2]);
        assert!(matches!(
            results[2],
            Err(InferError::Embedding(EmbedError::EmptyText))
        ));
    }

    #[test]
    fn distribution_percentages_cover_valid_total() {
        let mut inf = inferencer();
        let texts = ["esquerda a", "esquerda b", "centro c", "direita d"];
        let distribution = inf.analyze_media_bias(&texts).unwrap();

        assert_eq!(distribution.total_texts, 4);
        assert_eq!(distribution.failed_texts, 0);
        assert_eq!(distribution.percentages["Esquerda"], 50.0);
        assert_eq!(distribution.percentages["Centro"], 25.0);
        assert_eq!(distribution.percentages["Direita"], 25.0);
    }

    #[test]
    fn failures_excluded_from_percentage_denominator() {
        let mut inf = inferencer();
        let texts = ["esquerda a", "", "centro b"];
        let distribution = inf.analyze_media_bias(&texts).unwrap();

        assert_eq!(distribution.total_texts, 2);
        assert_eq!(distribution.failed_texts, 1);
        assert_eq!(distribution.percentages["Esquerda"], 50.0);
        assert_eq!(distribution.percentages["Centro"], 50.0);
        let sum: f64 = distribution.percentages.values().sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn all_failed_batch_is_an_error() {
        let mut inf = inferencer();
        let err = inf.analyze_media_bias(&["", "  ", ""]).unwrap_err();
        assert!(matches!(err, ModelError::NoValidPredictions));
    }

    #[test]
    fn predictions_file_keeps_one_row_per_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.csv");

        let mut inf = inferencer();
        let texts = ["centro a", "", "esquerda b"];
        inf.save_predictions(&texts, &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 4, "header + one row per input:\n{raw}");
        assert_eq!(lines[0], "text,prediction");
        assert!(lines[1].ends_with("Centro"));
        assert!(lines[2].ends_with(','), "failed row has empty prediction");
        assert!(lines[3].ends_with("Esquerda"));
    }

    #[test]
    fn loading_missing_model_fails() {
        let err = Inferencer::load(Path::new("/nonexistent/model.json"), StubEmbedder).unwrap_err();
        assert!(matches!(
            err,
            ModelError::Store(espectro_store::StoreError::ModelNotFound(_))
        ));
    }
}
