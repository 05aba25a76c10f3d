//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while running an external program.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Program not found on search path: {0}")]
    NotFound(String),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with code {code}")]
    NonZeroExit {
        program: String,
        code: i32,
        output: String,
    },

    #[error("{program} timed out after {seconds} seconds")]
    Timeout {
        program: String,
        seconds: u64,
        output: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// Captured output of the failed run, if the process got far enough to produce any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::NonZeroExit { output, .. } | Self::Timeout { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
