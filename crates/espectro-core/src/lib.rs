pub mod config;
pub mod orientation;
pub mod speech;

pub use config::{CollectConfig, Config, ConfigError, ModelConfig, PathsConfig};
pub use orientation::{ClassMap, Orientation};
pub use speech::{PredictionRow, Speech};
