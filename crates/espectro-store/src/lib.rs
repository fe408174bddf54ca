//! Persistence layer: embedding cache and classifier artifact store.

mod cache;
mod classifier_store;
mod error;

pub use cache::{CacheMode, EmbeddingCache};
pub use classifier_store::{load_classifier, save_classifier};
pub use error::StoreError;
