//! Runner backed by real operating-system processes.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::config::{CommandSpec, Deadline};
use crate::error::{RunnerError, RunnerResult};
use crate::runner::{ProcessOutput, ProcessRunner};

/// System runner options.
#[derive(Debug, Clone, Default)]
pub struct SystemRunnerOptions {
    /// Directories to search for programs, in `PATH` syntax.
    /// Falls back to the process `PATH` when unset.
    pub search_path: Option<OsString>,
}

impl SystemRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }
}

/// Runs programs with `tokio::process`.
///
/// On Unix every child is started in its own process group, and the whole
/// group is killed when the deadline passes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    options: SystemRunnerOptions,
}

impl SystemRunner {
    pub fn new(options: SystemRunnerOptions) -> Self {
        Self { options }
    }

    fn search_path(&self) -> Option<OsString> {
        self.options
            .search_path
            .clone()
            .or_else(|| std::env::var_os("PATH"))
    }

    fn spawn(&self, spec: &CommandSpec) -> RunnerResult<Child> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.workdir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: spec.display_name(),
            source,
        })
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        which::which_in(program, self.search_path(), cwd).ok()
    }

    async fn run(&self, spec: &CommandSpec, deadline: &Deadline) -> RunnerResult<ProcessOutput> {
        let program = spec.display_name();
        if deadline.is_expired() {
            return Err(RunnerError::Timeout {
                program,
                seconds: deadline.budget_secs(),
                output: String::new(),
            });
        }

        debug!("Executing: {}", spec.format_command());
        let started_at = Utc::now();
        let mut child = self.spawn(spec)?;
        let pid = child.id();

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("stderr not captured"))?;

        let mut output = String::new();
        let waited = tokio::time::timeout_at(
            deadline.instant(),
            collect_and_wait(&mut child, stdout, stderr, &mut output),
        )
        .await;

        let status = match waited {
            Ok(status) => status?,
            Err(_) => {
                warn!(
                    "{} exceeded its {}s deadline, terminating",
                    program,
                    deadline.budget_secs()
                );
                if let Some(pid) = pid {
                    kill_process_group(pid).await;
                }
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(RunnerError::Timeout {
                    program,
                    seconds: deadline.budget_secs(),
                    output,
                });
            }
        };

        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        debug!("{} finished in {}ms with {}", program, duration_ms, status);

        if !status.success() {
            return Err(RunnerError::NonZeroExit {
                program,
                code: status.code().unwrap_or(-1),
                output,
            });
        }

        Ok(ProcessOutput {
            output,
            started_at,
            finished_at,
            duration_ms,
        })
    }
}

/// Drain both pipes line by line into `output`, then reap the child.
async fn collect_and_wait(
    child: &mut Child,
    stdout: impl AsyncRead + Unpin,
    stderr: impl AsyncRead + Unpin,
    output: &mut String,
) -> io::Result<ExitStatus> {
    let mut stdout = BufReader::new(stdout);
    let mut stderr = BufReader::new(stderr);
    let mut out_line = Vec::new();
    let mut err_line = Vec::new();
    let (mut out_open, mut err_open) = (true, true);

    // read_until keeps partial lines in the buffer when the other branch wins.
    while out_open || err_open {
        tokio::select! {
            read = stdout.read_until(b'\n', &mut out_line), if out_open => {
                if read? == 0 {
                    out_open = false;
                }
                output.push_str(&String::from_utf8_lossy(&out_line));
                out_line.clear();
            }
            read = stderr.read_until(b'\n', &mut err_line), if err_open => {
                if read? == 0 {
                    err_open = false;
                }
                output.push_str(&String::from_utf8_lossy(&err_line));
                err_line.clear();
            }
        }
    }

    child.wait().await
}

#[cfg(unix)]
async fn kill_process_group(pid: u32) {
    // Negative pid addresses the group the child leads.
    let result = Command::new("kill")
        .args(["-KILL", "--", &format!("-{pid}")])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match result {
        Ok(status) if !status.success() => {
            debug!("kill for process group {} exited with {}", pid, status)
        }
        Ok(_) => {}
        Err(e) => warn!("Failed to kill process group {}: {}", pid, e),
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pid: u32) {}
