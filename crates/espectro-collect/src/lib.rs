//! Corpus collection: legislative speech API client and spectrum enrichment.

mod camara;
mod enricher;

use std::path::PathBuf;

use thiserror::Error;

pub use camara::{Deputy, DiscursosCollector, SpeechRow};
pub use enricher::{EnrichedSpeechRow, PartyRow, RawSpeechRow, SpectrumEnricher, SpectrumStats};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status} for {url}")]
    Server { status: u16, url: String },

    #[error("invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("csv error at {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
