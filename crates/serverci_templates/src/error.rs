//! Error types for templates.

use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while parsing or rendering a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Template line {line}: no value for \"{path}\"")]
    MissingKey { path: String, line: usize },

    #[error("Template line {line}: cannot render \"{path}\": {message}")]
    RenderingFailed {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Template data could not be serialized: {0}")]
    Data(#[from] serde_json::Error),

    #[error("Template is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
