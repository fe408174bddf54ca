//! Training pipeline: corpus CSV → embeddings → fitted classifier + metrics.

use std::path::Path;

use anyhow::Context;
use chrono::Local;
use tracing::{info, warn};

use espectro_ai::Embedder;
use espectro_core::Config;
use espectro_model::{Metrics, Trainer};

use crate::corpus;

pub fn run(config: &Config, corpus_path: Option<&Path>) -> anyhow::Result<()> {
    let default_path = config
        .paths
        .data_dir
        .join("speech")
        .join("Discursos_Enriquecidos.csv");
    let corpus_path = corpus_path.unwrap_or(&default_path);

    let speeches = corpus::read_speeches(corpus_path)?;
    info!(rows = speeches.len(), corpus = %corpus_path.display(), "starting training");

    let embedder = Embedder::load(&config.model.model_dir, config.model.max_length)
        .context("loading encoder")?;
    let mut trainer = Trainer::new(config, embedder);

    let (x, y) = trainer.prepare_data(&speeches).context("preparing data")?;
    let metrics = trainer.train(&x, &y).context("training classifier")?;
    if !metrics.converged {
        warn!(
            n_iter = metrics.n_iter,
            "classifier did not converge within the iteration cap"
        );
    }

    let model_path = config.model_path();
    trainer
        .save_model(&model_path)
        .context("saving classifier")?;

    let metrics_path = config.paths.output_dir.join(format!(
        "metrics_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    std::fs::write(&metrics_path, render_metrics(&metrics))
        .with_context(|| format!("writing metrics to {}", metrics_path.display()))?;

    info!(
        accuracy = metrics.accuracy,
        model = %model_path.display(),
        metrics = %metrics_path.display(),
        "training finished"
    );
    Ok(())
}

fn render_metrics(metrics: &Metrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("Accuracy: {:.4}\n", metrics.accuracy));
    if !metrics.converged {
        out.push_str(&format!(
            "Warning: did not converge within {} iterations\n",
            metrics.n_iter
        ));
    }
    out.push_str("\nClassification Report:\n");
    out.push_str(&metrics.classification_report);
    out.push_str("\nConfusion Matrix (row-normalized):\n");
    for row in &metrics.confusion_matrix {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:.3}")).collect();
        out.push_str(&format!("  [{}]\n", cells.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_rendering_includes_report_and_matrix() {
        let mut metrics = Metrics::evaluate(&[0, 1, 2, 0], &[0, 1, 2, 1]);
        metrics.converged = false;
        metrics.n_iter = 5000;

        let text = render_metrics(&metrics);
        assert!(text.starts_with("Accuracy: 0.7500"));
        assert!(text.contains("did not converge"));
        assert!(text.contains("Classification Report:"));
        assert!(text.contains("Confusion Matrix"));
        assert!(text.contains("Centro"));
    }

    #[test]
    fn converged_metrics_render_without_warning() {
        let metrics = Metrics::evaluate(&[0, 1, 2], &[0, 1, 2]);
        let text = render_metrics(&metrics);
        assert!(!text.contains("did not converge"));
    }
}
