//! Classifier core: seeded feed-forward net, stratified training, metrics,
//! and batched inference with per-item fault isolation.

mod error;
mod inferencer;
mod metrics;
mod net;
mod split;
mod trainer;

pub use error::{InferError, ModelError};
pub use inferencer::{BiasDistribution, Inferencer};
pub use metrics::Metrics;
pub use net::{FitOutcome, MlpClassifier, TrainOptions};
pub use split::stratified_split;
pub use trainer::Trainer;
