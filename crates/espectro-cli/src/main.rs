//! `espectro` — political bias analysis of Brazilian news portals.
//!
//! Pipeline: `collect` legislative speeches, `enrich` them with party
//! spectrum labels, `train` the classifier on speech embeddings, `analyze`
//! scraped portal text against the trained model.

mod analyze;
mod corpus;
mod train;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use espectro_collect::{DiscursosCollector, SpectrumEnricher};
use espectro_core::Config;

#[derive(Parser)]
#[command(name = "espectro", version, about = "Political bias analysis of Brazilian media")]
struct Cli {
    /// Configuration file; defaults apply when absent.
    #[arg(long, default_value = "espectro.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect deputy speeches from the Câmara dos Deputados API.
    Collect {
        /// Start date, YYYY-MM-DD.
        #[arg(long)]
        start: String,
        /// End date, YYYY-MM-DD.
        #[arg(long)]
        end: String,
    },
    /// Join collected speeches with each party's spectrum label.
    Enrich,
    /// Train the classifier on the enriched speech corpus.
    Train {
        /// Corpus CSV; defaults to the enriched corpus under data_dir.
        #[arg(long)]
        corpus: Option<PathBuf>,
    },
    /// Analyze portal text files against the trained classifier.
    Analyze {
        /// Analyze a single portal instead of every configured one.
        #[arg(long)]
        portal: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config).context("loading configuration")?;
    ensure_directories(&config)?;

    match cli.command {
        Command::Collect { start, end } => run_collect(&config, &start, &end).await,
        Command::Enrich => run_enrich(&config),
        Command::Train { corpus } => train::run(&config, corpus.as_deref()),
        Command::Analyze { portal } => analyze::run(&config, portal.as_deref()),
    }
}

fn ensure_directories(config: &Config) -> anyhow::Result<()> {
    for dir in [
        &config.paths.data_dir,
        &config.paths.models_dir,
        &config.paths.output_dir,
        &config.paths.data_dir.join("speech"),
        &config.paths.data_dir.join("portals"),
    ] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
    }
    Ok(())
}

async fn run_collect(config: &Config, start: &str, end: &str) -> anyhow::Result<()> {
    let collector = DiscursosCollector::new(config.collect.base_url.clone());
    let rows = collector
        .collect(start, end)
        .await
        .context("collecting speeches")?;

    let path = config.paths.data_dir.join("speech").join("Discursos.csv");
    DiscursosCollector::save_rows(&rows, &path).context("saving speech corpus")?;
    info!(rows = rows.len(), path = %path.display(), "collection finished");
    Ok(())
}

fn run_enrich(config: &Config) -> anyhow::Result<()> {
    let speech_dir = config.paths.data_dir.join("speech");
    let enricher = SpectrumEnricher::load(
        &speech_dir.join("Partidos.csv"),
        &speech_dir.join("Discursos.csv"),
    )
    .context("loading enrichment inputs")?;

    let rows = enricher.enrich();
    for (spectrum, stats) in SpectrumEnricher::spectrum_statistics(&rows) {
        info!(
            spectrum = %spectrum,
            speeches = stats.speeches,
            parties = stats.parties,
            deputies = stats.deputies,
            "spectrum totals"
        );
    }

    let output = speech_dir.join("Discursos_Enriquecidos.csv");
    SpectrumEnricher::save_enriched(&rows, &output).context("saving enriched corpus")?;
    info!(rows = rows.len(), path = %output.display(), "enrichment finished");
    Ok(())
}
