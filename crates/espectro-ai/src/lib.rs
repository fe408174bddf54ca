//! Text embedding: the `TextEmbedder` seam and its ONNX Runtime implementation.

mod embedder;

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

pub use embedder::Embedder;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("cannot embed empty text")]
    EmptyText,

    #[error("encoder file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("encoder inference error: {0}")]
    Session(#[from] ort::Error),

    #[error("unexpected encoder output shape: {0}")]
    OutputShape(String),
}

/// Turns texts into fixed-dimension dense vectors.
///
/// Implemented by the ONNX [`Embedder`] and by test doubles. Calls are
/// stateless with respect to the input but expensive, so batch sizing is the
/// caller's lever for bounding peak memory.
pub trait TextEmbedder {
    /// Embedding dimensionality.
    fn dim(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in input order.
    ///
    /// Fails with [`EmbedError::EmptyText`] if any text is empty or
    /// whitespace-only.
    fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a single text.
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors.pop().ok_or_else(|| {
            EmbedError::OutputShape("embed_batch returned no vector for one input".to_string())
        })
    }

    /// Embed a whole corpus in chunks of `batch_size`, logging progress.
    ///
    /// Chunking bounds the intermediate token/activation buffers; it is not
    /// a concurrency mechanism.
    fn embed_all(&mut self, texts: &[&str], batch_size: usize) -> Result<Vec<Vec<f32>>, EmbedError> {
        let total = texts.len();
        let mut vectors = Vec::with_capacity(total);
        for chunk in texts.chunks(batch_size.max(1)) {
            let batch = self.embed_batch(chunk)?;
            vectors.extend(batch);
            info!(embedded = vectors.len(), total, "embedding corpus");
        }
        Ok(vectors)
    }
}
