//! Process runner trait and types.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::{CommandSpec, Deadline};
use crate::error::RunnerResult;

/// Result of a successful program run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Combined stdout and stderr, in arrival order
    pub output: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Runs external programs under a deadline.
///
/// A run that exits non-zero or outlives its deadline is an error carrying
/// the output captured so far. Output is never interpreted.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Resolve a program name on the search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run a program to completion.
    async fn run(&self, command: &CommandSpec, deadline: &Deadline) -> RunnerResult<ProcessOutput>;

    /// Whether a program can be found at all.
    fn is_available(&self, program: &str) -> bool {
        self.locate(program).is_some()
    }
}
