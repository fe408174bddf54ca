//! Typed configuration, loaded once at process start.
//!
//! Every component takes the sections it needs by reference; there is no
//! global configuration object and no string-keyed lookup. Fields missing
//! from the TOML file fall back to the documented defaults, and the whole
//! schema is validated at load time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orientation::ClassMap;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration. Loaded from `espectro.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: PathsConfig,
    pub model: ModelConfig,
    pub collect: CollectConfig,
}

/// Working directories, created at startup if absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub models_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            models_dir: PathBuf::from("models"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Encoder, classifier and embedding-cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Directory holding the pretrained encoder (`model.onnx` + `tokenizer.json`).
    pub model_dir: PathBuf,
    /// Token cap per text; longer inputs are truncated from the tail.
    pub max_length: usize,
    /// Texts per encoder forward pass. Bounds peak activation memory.
    pub batch_size: usize,
    /// Spectrum label → class code (0 = Centro, 1 = Direita, 2 = Esquerda).
    pub class_mapping: HashMap<String, usize>,
    /// Seed for the train/test split and classifier initialisation.
    pub random_state: u64,
    /// Width of the single hidden layer.
    pub hidden_units: usize,
    /// Training iteration cap. A safety bound, not a tuning target.
    pub max_iter: usize,
    /// Held-out fraction for the stratified split.
    pub test_fraction: f64,
    /// Reuse a previously persisted embedding matrix when present.
    pub reuse_embeddings: bool,
    /// Embedding cache file name, relative to `models_dir`.
    pub embeddings_file: String,
    /// When reusing, require the cached fingerprint to match the current
    /// corpus; a mismatch recomputes instead of trusting the file.
    pub validate_cache: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/bert-base-portuguese-cased"),
            max_length: 512,
            batch_size: 10,
            class_mapping: ClassMap::default_codes(),
            random_state: 1,
            hidden_units: 100,
            max_iter: 5000,
            test_fraction: 0.25,
            reuse_embeddings: false,
            embeddings_file: "speech_embeddings.json".to_string(),
            validate_cache: false,
        }
    }
}

/// Speech collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectConfig {
    /// Câmara dos Deputados open-data API root.
    pub base_url: String,
    /// News portals with per-portal text files under `data_dir/portals`.
    pub portals: Vec<String>,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dadosabertos.camara.leg.br/api/v2".to_string(),
            portals: ["G1", "CNN", "Folha", "Gazeta", "Istoe", "Metropoles"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    /// Load from a TOML file, falling back to per-field defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise the full defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// The validated spectrum→class table.
    pub fn class_map(&self) -> ClassMap {
        // validate() already checked the codes; default table as backstop.
        ClassMap::from_codes(&self.model.class_mapping).unwrap_or_default()
    }

    /// Path of the persisted classifier artifact.
    pub fn model_path(&self) -> PathBuf {
        self.paths.models_dir.join("political_bias_model.json")
    }

    /// Path of the persisted embedding matrix.
    pub fn embeddings_path(&self) -> PathBuf {
        self.paths.models_dir.join(&self.model.embeddings_file)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ClassMap::from_codes(&self.model.class_mapping).map_err(ConfigError::Invalid)?;
        if self.model.class_mapping.is_empty() {
            return Err(ConfigError::Invalid("class_mapping is empty".into()));
        }
        if self.model.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.model.max_length == 0 {
            return Err(ConfigError::Invalid("max_length must be at least 1".into()));
        }
        if self.model.hidden_units == 0 {
            return Err(ConfigError::Invalid("hidden_units must be at least 1".into()));
        }
        if self.model.max_iter == 0 {
            return Err(ConfigError::Invalid("max_iter must be at least 1".into()));
        }
        if !(self.model.test_fraction > 0.0 && self.model.test_fraction < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "test_fraction must be in (0, 1), got {}",
                self.model.test_fraction
            )));
        }
        Ok(())
    }
}
