//! Error types for the authorage library.
//!
//! All library operations report failures through [`AuthorAgeError`]. The
//! command-line layer wraps these into a
//! [`TerminateTool`](crate::cli::TerminateTool) carrying an exit code.
//!
//! # Examples
//!
//! ```
//! use authorage::error::{AuthorAgeError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(AuthorAgeError::invalid_argument("Invalid input"))
//! }
//!
//! assert!(example_operation().is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for authorage operations.
#[derive(Error, Debug)]
pub enum AuthorAgeError {
    /// I/O errors (file operations, standard streams)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Analysis-related errors (tokenization, feature generation)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Model-related errors (prediction on an inconsistent model, etc.)
    #[error("Model error: {0}")]
    Model(String),

    /// A model file could not be read or decoded
    #[error("Model loading failed: {path}: {message}")]
    ModelLoad { path: String, message: String },

    /// A model file could not be written
    #[error("Model saving failed: {path}: {message}")]
    ModelSave { path: String, message: String },

    /// Not enough samples to train a model
    #[error("Training data insufficient: need at least {min_samples} samples, got {actual}")]
    InsufficientTrainingData { min_samples: usize, actual: usize },

    /// Feature vector does not match the model
    #[error("Invalid feature vector: {0}")]
    InvalidFeatureVector(String),

    /// Malformed sample data
    #[error("Format error: {0}")]
    Format(String),

    /// Binary model serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument passed to an operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with AuthorAgeError.
pub type Result<T> = std::result::Result<T, AuthorAgeError>;

impl AuthorAgeError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        AuthorAgeError::Analysis(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        AuthorAgeError::Model(msg.into())
    }

    /// Create a new sample format error.
    pub fn format<S: Into<String>>(msg: S) -> Self {
        AuthorAgeError::Format(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        AuthorAgeError::InvalidArgument(msg.into())
    }

    /// Create a new invalid feature vector error.
    pub fn invalid_feature_vector<S: Into<String>>(msg: S) -> Self {
        AuthorAgeError::InvalidFeatureVector(msg.into())
    }

    /// Create a new model load error for `path`.
    pub fn model_load<P: AsRef<std::path::Path>, S: Into<String>>(path: P, msg: S) -> Self {
        AuthorAgeError::ModelLoad {
            path: path.as_ref().display().to_string(),
            message: msg.into(),
        }
    }

    /// Create a new model save error for `path`.
    pub fn model_save<P: AsRef<std::path::Path>, S: Into<String>>(path: P, msg: S) -> Self {
        AuthorAgeError::ModelSave {
            path: path.as_ref().display().to_string(),
            message: msg.into(),
        }
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        AuthorAgeError::Other(msg.into())
    }
}
