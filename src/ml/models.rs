//! Model metadata and on-disk persistence.
//!
//! Models are written with `bincode` behind a small header naming the model
//! kind and format version, so loading a regression model where a
//! classification model is expected fails with a clear message instead of a
//! decode error.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AuthorAgeError, Result};

const MAGIC: &str = "authorage-model";

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Model metadata recorded at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name/identifier.
    pub name: String,
    /// Language of the training data.
    pub language: String,
    /// Training timestamp.
    pub trained_at: chrono::DateTime<chrono::Utc>,
    /// Number of training examples used.
    pub training_examples: usize,
    /// Model hyperparameters.
    pub hyperparameters: BTreeMap<String, f64>,
}

impl ModelMetadata {
    /// Create metadata stamped with the current time.
    pub fn new<N: Into<String>, L: Into<String>>(name: N, language: L) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            trained_at: chrono::Utc::now(),
            training_examples: 0,
            hyperparameters: BTreeMap::new(),
        }
    }

    /// Record a hyperparameter.
    pub fn with_hyperparameter<K: Into<String>>(mut self, key: K, value: f64) -> Self {
        self.hyperparameters.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelHeader {
    magic: String,
    kind: String,
    version: u32,
}

/// Write `model` to `path` under the given kind.
pub fn write_model<T: Serialize>(path: &Path, kind: &str, model: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| AuthorAgeError::model_save(path, e.to_string()))?;
    let mut writer = BufWriter::new(file);

    let header = ModelHeader {
        magic: MAGIC.to_string(),
        kind: kind.to_string(),
        version: FORMAT_VERSION,
    };
    bincode::serialize_into(&mut writer, &header)
        .and_then(|_| bincode::serialize_into(&mut writer, model))
        .map_err(|e| AuthorAgeError::model_save(path, e.to_string()))?;
    writer
        .flush()
        .map_err(|e| AuthorAgeError::model_save(path, e.to_string()))?;

    log::debug!("wrote {kind} model to {}", path.display());
    Ok(())
}

/// Read a model of the given kind from `path`.
pub fn read_model<T: DeserializeOwned>(path: &Path, kind: &str) -> Result<T> {
    // Decode from memory: slice decoding bounds every length prefix by the
    // bytes actually present, a stream reader allocates first.
    let bytes = std::fs::read(path).map_err(|e| AuthorAgeError::model_load(path, e.to_string()))?;

    let header: ModelHeader = bincode::deserialize(&bytes)
        .map_err(|_| AuthorAgeError::model_load(path, "not an authorage model file"))?;
    if header.magic != MAGIC {
        return Err(AuthorAgeError::model_load(
            path,
            "not an authorage model file",
        ));
    }
    if header.kind != kind {
        return Err(AuthorAgeError::model_load(
            path,
            format!("expected a {kind} model, found a {} model", header.kind),
        ));
    }
    if header.version != FORMAT_VERSION {
        return Err(AuthorAgeError::model_load(
            path,
            format!("unsupported model version {}", header.version),
        ));
    }

    let offset = bincode::serialized_size(&header)
        .map_err(|e| AuthorAgeError::model_load(path, e.to_string()))? as usize;
    let body = bytes
        .get(offset..)
        .ok_or_else(|| AuthorAgeError::model_load(path, "truncated model file"))?;
    bincode::deserialize(body).map_err(|e| AuthorAgeError::model_load(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Dummy {
        weights: Vec<f64>,
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.bin");
        let model = Dummy {
            weights: vec![1.0, -2.5],
        };

        write_model(&path, "dummy", &model).unwrap();
        let loaded: Dummy = read_model(&path, "dummy").unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_kind_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.bin");
        write_model(&path, "dummy", &Dummy { weights: vec![] }).unwrap();

        let err = read_model::<Dummy>(&path, "regression").unwrap_err();
        assert!(err.to_string().contains("expected a regression model"));
    }

    #[test]
    fn test_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"hello").unwrap();

        let err = read_model::<Dummy>(&path, "dummy").unwrap_err();
        assert!(err.to_string().contains("not an authorage model file"));
    }

    #[test]
    fn test_text_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.txt");
        std::fs::write(&path, "18-24\tlol the party was lit\n70\tmy garden\n").unwrap();

        let err = read_model::<Dummy>(&path, "dummy").unwrap_err();
        assert!(matches!(err, AuthorAgeError::ModelLoad { .. }));
        assert!(err.to_string().contains("not an authorage model file"));
    }

    #[test]
    fn test_truncated_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.bin");
        write_model(&path, "dummy", &Dummy { weights: vec![1.0; 16] }).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 20]).unwrap();

        let err = read_model::<Dummy>(&path, "dummy").unwrap_err();
        assert!(matches!(err, AuthorAgeError::ModelLoad { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = read_model::<Dummy>(Path::new("/nonexistent/model.bin"), "dummy").unwrap_err();
        assert!(matches!(err, AuthorAgeError::ModelLoad { .. }));
    }

    #[test]
    fn test_metadata_hyperparameters() {
        let metadata = ModelMetadata::new("maxent", "en").with_hyperparameter("cutoff", 5.0);
        assert_eq!(metadata.hyperparameters.get("cutoff"), Some(&5.0));
        assert_eq!(metadata.training_examples, 0);
    }
}
