//! Embedding cache: persist a corpus's embedding matrix so later training
//! runs skip the expensive encoder pass.
//!
//! Two reuse modes. `Convention` trusts the reuse flag plus file existence
//! and never checks that the persisted matrix corresponds to the current
//! corpus — the original contract, kept for parity. `Fingerprint` stores a
//! SHA-256 over the ordered text sequence and treats any mismatch as a miss.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use espectro_ai::TextEmbedder;

use crate::StoreError;

/// Staleness policy for cache reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Trust file existence; no validation against the current corpus.
    Convention,
    /// Require the persisted fingerprint and row count to match the current
    /// corpus; a mismatch recomputes and rewrites.
    Fingerprint,
}

/// Persisted artifact. One file per corpus identity.
#[derive(Debug, Serialize, Deserialize)]
struct CachedEmbeddings {
    /// SHA-256 over the ordered text sequence, present in fingerprint mode.
    fingerprint: Option<String>,
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

/// Get-or-compute cache for a corpus's embedding matrix.
///
/// Not safe under concurrent writers to the same path; callers running
/// multiple training jobs against one corpus identity must serialize access.
pub struct EmbeddingCache {
    path: PathBuf,
    reuse: bool,
    mode: CacheMode,
    batch_size: usize,
}

impl EmbeddingCache {
    /// `path` is the corpus identity: one cache file per training dataset.
    pub fn new(path: PathBuf, reuse: bool, mode: CacheMode, batch_size: usize) -> Self {
        Self {
            path,
            reuse,
            mode,
            batch_size,
        }
    }

    /// Return the persisted matrix when reuse permits, otherwise compute via
    /// `embedder`, persist, and return.
    ///
    /// A cache file that exists but fails to deserialize is a
    /// [`StoreError::CacheCorrupt`] — never a silent fallback to recompute.
    /// Only "file not found" means compute.
    pub fn get_or_compute<E: TextEmbedder>(
        &self,
        texts: &[&str],
        embedder: &mut E,
    ) -> Result<Vec<Vec<f32>>, StoreError> {
        if self.reuse {
            match self.load()? {
                Some(cached) if self.accepts(&cached, texts) => {
                    info!(
                        rows = cached.vectors.len(),
                        dim = cached.dim,
                        path = %self.path.display(),
                        "reusing persisted embeddings"
                    );
                    return Ok(cached.vectors);
                }
                Some(_) => {
                    warn!(
                        path = %self.path.display(),
                        "persisted embeddings do not match current corpus, recomputing"
                    );
                }
                None => {}
            }
        }

        let vectors = embedder.embed_all(texts, self.batch_size)?;
        self.persist(texts, &vectors)?;
        Ok(vectors)
    }

    fn accepts(&self, cached: &CachedEmbeddings, texts: &[&str]) -> bool {
        match self.mode {
            CacheMode::Convention => true,
            CacheMode::Fingerprint => {
                cached.vectors.len() == texts.len()
                    && cached.fingerprint.as_deref() == Some(fingerprint(texts).as_str())
            }
        }
    }

    /// `Ok(None)` when the file does not exist; corrupt content is an error.
    fn load(&self) -> Result<Option<CachedEmbeddings>, StoreError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let cached = serde_json::from_slice(&raw).map_err(|e| StoreError::CacheCorrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(cached))
    }

    fn persist(&self, texts: &[&str], vectors: &[Vec<f32>]) -> Result<(), StoreError> {
        let artifact = CachedEmbeddings {
            fingerprint: match self.mode {
                CacheMode::Convention => None,
                CacheMode::Fingerprint => Some(fingerprint(texts)),
            },
            dim: vectors.first().map(|v| v.len()).unwrap_or(0),
            vectors: vectors.to_vec(),
        };

        let raw = serde_json::to_vec(&artifact).map_err(|e| StoreError::CorruptModel {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, raw).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(
            rows = artifact.vectors.len(),
            dim = artifact.dim,
            path = %self.path.display(),
            "persisted embeddings"
        );
        Ok(())
    }
}

/// SHA-256 over the ordered text sequence, length-prefixed so adjacent texts
/// cannot alias.
fn fingerprint(texts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for text in texts {
        hasher.update((text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
