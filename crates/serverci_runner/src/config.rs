//! Command and deadline configuration types.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::Instant;

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or resolved path
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<OsString>,
    /// Working directory (inherits the caller's when unset)
    pub workdir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Short name used in logs and errors: the file name of the program.
    pub fn display_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// The full command line, shell-quoted where needed, for debug logs.
    pub fn format_command(&self) -> String {
        let mut cmd = quote(self.program.as_os_str());
        for arg in &self.args {
            cmd.push(' ');
            cmd.push_str(&quote(arg));
        }
        cmd
    }

    pub fn workdir_path(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }
}

fn quote(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    if arg.contains(' ') {
        format!("'{arg}'")
    } else {
        arg.into_owned()
    }
}

/// A point in time after which a running program is terminated.
///
/// One deadline is shared by every invocation of a compile, so later passes
/// only get what earlier passes left over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn after_secs(seconds: u64) -> Self {
        Self::after(Duration::from_secs(seconds))
    }

    pub fn instant(&self) -> Instant {
        self.at
    }

    /// The total budget this deadline was created with.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Whole seconds of the budget, as reported in timeout errors.
    pub fn budget_secs(&self) -> u64 {
        self.budget.as_secs()
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }
}
