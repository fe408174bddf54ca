use thiserror::Error;

use espectro_ai::EmbedError;
use espectro_store::StoreError;

/// Structural failures: these abort the training or analysis run.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no training examples remain after dropping unmapped rows")]
    EmptyDataset,

    #[error("classifier has not been trained yet")]
    UntrainedModel,

    #[error("every text in the batch failed prediction")]
    NoValidPredictions,

    #[error("embedding has {got} dimensions, classifier expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error("io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write predictions: {0}")]
    Csv(#[from] csv::Error),
}

/// Per-item inference failure. Recovered locally inside `predict_batch`:
/// converted to the failure arm of the per-item result and logged, never
/// propagated to the caller.
#[derive(Debug, Error)]
pub enum InferError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("classification failed: {0}")]
    Classifier(String),
}
