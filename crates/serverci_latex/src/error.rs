//! Error types for LaTeX compilation.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::Engine;

/// Result type alias for compilation.
pub type LatexResult<T> = Result<T, LatexError>;

/// Errors that can occur while compiling a document.
#[derive(Error, Debug)]
pub enum LatexError {
    #[error("Output path cannot be empty")]
    EmptyOutputPath,

    #[error("Output path has no file name: {0}")]
    InvalidOutputPath(PathBuf),

    #[error("{engine} not found on search path and latexmk is unavailable")]
    MissingToolchain { engine: Engine },

    #[error("latexmk failed:\n{tail}")]
    DriverFailed { tail: String },

    #[error("{engine} pass {pass} failed:\n{tail}")]
    PassFailed {
        engine: Engine,
        pass: usize,
        tail: String,
    },

    #[error("Compilation timed out after {seconds} seconds:\n{tail}")]
    Timeout { seconds: u64, tail: String },

    #[error("Runner error: {0}")]
    Runner(#[from] serverci_runner::RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LatexError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Tail of the compiler output, for failures that produced any.
    pub fn tail(&self) -> Option<&str> {
        match self {
            Self::DriverFailed { tail } | Self::PassFailed { tail, .. } | Self::Timeout { tail, .. } => {
                Some(tail)
            }
            _ => None,
        }
    }
}
