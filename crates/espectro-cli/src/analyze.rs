//! Analysis pipeline: portal text files → predictions CSV + distribution
//! report per portal.

use anyhow::Context;
use tracing::{info, warn};

use espectro_ai::Embedder;
use espectro_core::Config;
use espectro_model::{BiasDistribution, Inferencer, ModelError};

use crate::corpus;

pub fn run(config: &Config, portal: Option<&str>) -> anyhow::Result<()> {
    let model_path = config.model_path();
    if !model_path.exists() {
        anyhow::bail!(
            "classifier not found at {} — run `espectro train` first",
            model_path.display()
        );
    }

    let embedder = Embedder::load(&config.model.model_dir, config.model.max_length)
        .context("loading encoder")?;
    let mut inferencer = Inferencer::load(&model_path, embedder).context("loading classifier")?;

    let portals: Vec<&str> = match portal {
        Some(name) => vec![name],
        None => config.collect.portals.iter().map(String::as_str).collect(),
    };

    for portal in portals {
        info!(portal, "analyzing portal");

        let input = config
            .paths
            .data_dir
            .join("portals")
            .join(format!("{portal}_political_news.txt"));
        if !input.exists() {
            warn!(portal, path = %input.display(), "portal file not found, skipping");
            continue;
        }

        let texts = corpus::read_portal_texts(&input)?;
        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let predictions_path = config
            .paths
            .output_dir
            .join(format!("{portal}_predictions.csv"));
        inferencer
            .save_predictions(&text_refs, &predictions_path)
            .with_context(|| format!("saving predictions for {portal}"))?;

        match inferencer.analyze_media_bias(&text_refs) {
            Ok(distribution) => {
                let analysis_path = config
                    .paths
                    .output_dir
                    .join(format!("{portal}_analysis.txt"));
                std::fs::write(&analysis_path, render_analysis(portal, &distribution))
                    .with_context(|| format!("writing analysis for {portal}"))?;
                info!(portal, path = %analysis_path.display(), "portal analysis finished");
            }
            Err(ModelError::NoValidPredictions) => {
                warn!(portal, "no valid predictions, skipping distribution report");
            }
            Err(other) => return Err(other).context(format!("analyzing {portal}")),
        }
    }

    Ok(())
}

fn render_analysis(portal: &str, distribution: &BiasDistribution) -> String {
    let mut out = String::new();
    out.push_str(&format!("Análise de Viés Político - {portal}\n"));
    out.push_str(&format!(
        "Total de textos analisados: {}\n",
        distribution.total_texts
    ));
    if distribution.failed_texts > 0 {
        out.push_str(&format!(
            "Textos com falha de predição: {}\n",
            distribution.failed_texts
        ));
    }
    out.push_str("\nDistribuição por orientação política:\n");
    for (orientation, percentage) in &distribution.percentages {
        out.push_str(&format!("{orientation}: {percentage:.1}%\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn analysis_report_lists_percentages() {
        let distribution = BiasDistribution {
            total_texts: 4,
            failed_texts: 1,
            percentages: BTreeMap::from([
                ("Centro".to_string(), 25.0),
                ("Direita".to_string(), 25.0),
                ("Esquerda".to_string(), 50.0),
            ]),
        };

        let text = render_analysis("G1", &distribution);
        assert!(text.contains("Análise de Viés Político - G1"));
        assert!(text.contains("Total de textos analisados: 4"));
        assert!(text.contains("Textos com falha de predição: 1"));
        assert!(text.contains("Esquerda: 50.0%"));
        assert!(text.contains("Centro: 25.0%"));
    }

    #[test]
    fn clean_run_omits_failure_line() {
        let distribution = BiasDistribution {
            total_texts: 2,
            failed_texts: 0,
            percentages: BTreeMap::from([("Centro".to_string(), 100.0)]),
        };
        let text = render_analysis("Folha", &distribution);
        assert!(!text.contains("falha"));
    }
}
