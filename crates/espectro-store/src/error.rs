use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("embedding cache {path} is unreadable: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("model artifact {path} is unreadable: {reason}")]
    CorruptModel { path: PathBuf, reason: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Embed(#[from] espectro_ai::EmbedError),
}
