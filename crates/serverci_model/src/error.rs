//! Error types for the model module.

use std::path::PathBuf;
use thiserror::Error;

use crate::validator::ValidationErrors;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while decoding or validating a document.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown top-level field in document: {0}")]
    UnknownField(String),

    #[error("Cannot read document {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document validation failed:\n{0}")]
    Validation(#[from] ValidationErrors),
}
