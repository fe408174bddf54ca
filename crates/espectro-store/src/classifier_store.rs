//! Classifier artifact store.
//!
//! The serialization format is opaque to the rest of the system; the only
//! contract is exact round-trip of predict behavior. Weights are `f32`, and
//! JSON represents every `f32` exactly, so a load reproduces the saved
//! classifier bit-for-bit.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::StoreError;

/// Serialize a fitted classifier to `path`.
pub fn save_classifier<T: Serialize>(classifier: &T, path: &Path) -> Result<(), StoreError> {
    let raw = serde_json::to_vec_pretty(classifier).map_err(|e| StoreError::CorruptModel {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, raw).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "saved classifier");
    Ok(())
}

/// Load a classifier from `path`.
///
/// A missing file is [`StoreError::ModelNotFound`]; anything else that
/// prevents deserialization is [`StoreError::CorruptModel`].
pub fn load_classifier<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::ModelNotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let classifier = serde_json::from_slice(&raw).map_err(|e| StoreError::CorruptModel {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    info!(path = %path.display(), "loaded classifier");
    Ok(classifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct FakeModel {
        weights: Vec<f32>,
        bias: f32,
    }

    #[test]
    fn round_trip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let model = FakeModel {
            weights: vec![0.1, -2.5e-8, 3.0, f32::MIN_POSITIVE],
            bias: -0.25,
        };
        save_classifier(&model, &path).unwrap();
        let loaded: FakeModel = load_classifier(&path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn missing_file_is_model_not_found() {
        let err = load_classifier::<FakeModel>(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, StoreError::ModelNotFound(_)));
    }

    #[test]
    fn garbage_file_is_corrupt_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"definitely not json").unwrap();

        let err = load_classifier::<FakeModel>(&path).unwrap_err();
        assert!(matches!(err, StoreError::CorruptModel { .. }));
    }
}
