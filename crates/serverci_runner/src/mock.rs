//! Mock process runner for testing.
//!
//! Provides a configurable mock implementation of the ProcessRunner trait
//! for use in unit tests without requiring an installed TeX toolchain.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::{CommandSpec, Deadline};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ProcessOutput, ProcessRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure(i32),
    Timeout,
}

/// Predefined mock response for a program run.
#[derive(Debug, Clone)]
pub struct MockResponse {
    outcome: Outcome,
    pub output: String,
    pub duration_ms: u64,
    /// Files written (relative to the working directory) before the run returns.
    pub files: Vec<(PathBuf, Vec<u8>)>,
}

impl MockResponse {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Success,
            output: output.into(),
            duration_ms: 100,
            files: Vec::new(),
        }
    }

    pub fn failure(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failure(exit_code),
            ..Self::success(output)
        }
    }

    /// The run outlives its deadline.
    pub fn timeout(output: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Timeout,
            ..Self::success(output)
        }
    }

    /// Create a file as a side effect of the run, like a compiler leaving artifacts.
    pub fn writes(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.into(), contents.into()));
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub program: String,
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
}

/// Mock process runner for testing.
///
/// This runner captures all calls and returns predefined responses,
/// allowing tests to verify invocation behavior without actually
/// running programs.
#[derive(Clone)]
pub struct MockRunner {
    /// Programs that "exist", by name.
    installed: Arc<RwLock<HashMap<String, PathBuf>>>,
    /// Predefined responses for run calls.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    /// Index of next response to return.
    response_index: Arc<AtomicUsize>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated spawn failure.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner with nothing installed.
    pub fn new() -> Self {
        Self {
            installed: Arc::new(RwLock::new(HashMap::new())),
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Make a program resolvable, at `/usr/bin/<name>`.
    pub fn install(self, program: impl Into<String>) -> Self {
        let program = program.into();
        let path = PathBuf::from("/usr/bin").join(&program);
        self.installed.write().insert(program, path);
        self
    }

    /// Add a mock response for the next run call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Fail every run as if the program could not be spawned.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Check if a specific method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.method == method)
    }

    /// Get calls to a specific method.
    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }
}

#[async_trait]
impl ProcessRunner for MockRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.record_call(CapturedCall {
            method: "locate".to_string(),
            program: program.to_string(),
            args: Vec::new(),
            workdir: None,
        });
        self.installed.read().get(program).cloned()
    }

    async fn run(&self, command: &CommandSpec, deadline: &Deadline) -> RunnerResult<ProcessOutput> {
        let program = command.display_name();
        self.record_call(CapturedCall {
            method: "run".to_string(),
            program: program.clone(),
            args: command
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            workdir: command.workdir.clone(),
        });

        if let Some(message) = self.simulate_failure.read().clone() {
            return Err(RunnerError::Spawn {
                program,
                source: std::io::Error::other(message),
            });
        }

        let response = self.next_response();
        if response.outcome == Outcome::Timeout || deadline.is_expired() {
            return Err(RunnerError::Timeout {
                program,
                seconds: deadline.budget_secs(),
                output: response.output,
            });
        }

        for (path, contents) in &response.files {
            let path = match &command.workdir {
                Some(dir) => dir.join(path),
                None => path.clone(),
            };
            tokio::fs::write(&path, contents).await?;
        }

        if let Outcome::Failure(code) = response.outcome {
            return Err(RunnerError::NonZeroExit {
                program,
                code,
                output: response.output,
            });
        }

        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);
        Ok(ProcessOutput {
            output: response.output,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        })
    }
}
