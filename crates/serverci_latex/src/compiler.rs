//! Compilation orchestrator.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use serverci_runner::{CommandSpec, Deadline, ProcessRunner, RunnerError};

use crate::engine::Engine;
use crate::error::{LatexError, LatexResult};
use crate::job::Job;

pub const LATEXMK: &str = "latexmk";

/// Compile options.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Use latexmk when it is installed
    pub use_latexmk: bool,
    /// Passes of the raw engine when latexmk is not used
    pub max_passes: usize,
    /// Characters of compiler output kept in errors
    pub tail_chars: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            use_latexmk: true,
            max_passes: 3,
            tail_chars: 2000,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always drive the raw engine.
    pub fn without_latexmk(mut self) -> Self {
        self.use_latexmk = false;
        self
    }

    pub fn passes(mut self, passes: usize) -> Self {
        self.max_passes = passes.max(1);
        self
    }

    pub fn tail_chars(mut self, chars: usize) -> Self {
        self.tail_chars = chars;
        self
    }
}

/// The program that does the work, chosen once per compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toolchain {
    /// latexmk at the given path; it runs the engine as often as needed.
    Latexmk(PathBuf),
    /// The engine binary itself, run a fixed number of passes.
    Engine(Engine, PathBuf),
}

/// Turns LaTeX source into a PDF with whatever toolchain is installed.
pub struct LatexCompiler {
    runner: Arc<dyn ProcessRunner>,
    options: CompileOptions,
}

impl LatexCompiler {
    /// Create a new compiler.
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Probe the search path for latexmk, then for the engine.
    pub fn toolchain(&self, engine: Engine) -> LatexResult<Toolchain> {
        if self.options.use_latexmk {
            if let Some(path) = self.runner.locate(LATEXMK) {
                return Ok(Toolchain::Latexmk(path));
            }
        }
        self.runner
            .locate(engine.binary())
            .map(|path| Toolchain::Engine(engine, path))
            .ok_or(LatexError::MissingToolchain { engine })
    }

    /// Compile `source` into the PDF named by `output`.
    ///
    /// Every run shares `deadline`. Returns the path of the PDF. Auxiliary
    /// files are removed on success and left for inspection on failure;
    /// the temporary source is always removed.
    pub async fn compile(
        &self,
        source: &[u8],
        output: &Path,
        deadline: &Deadline,
    ) -> LatexResult<PathBuf> {
        let job = Job::from_output_path(output)?;
        job.prepare()?;

        let engine = Engine::select(source);
        let toolchain = self.toolchain(engine)?;
        info!("Compiling {} with {} via {:?}", job.name, engine, toolchain);

        let source_path = job.write_source(source)?;
        let result = match &toolchain {
            Toolchain::Latexmk(latexmk) => {
                self.run_latexmk(latexmk, engine, &job, &source_path, deadline)
                    .await
            }
            Toolchain::Engine(engine, binary) => {
                self.run_passes(binary, *engine, &job, &source_path, deadline)
                    .await
            }
        };
        if let Err(e) = source_path.close() {
            warn!("Failed to remove temporary source: {}", e);
        }
        result?;

        job.cleanup_aux_files();
        let pdf = job.pdf_path();
        info!("Compiled {}", pdf.display());
        Ok(pdf)
    }

    async fn run_latexmk(
        &self,
        latexmk: &Path,
        engine: Engine,
        job: &Job,
        source: &Path,
        deadline: &Deadline,
    ) -> LatexResult<()> {
        let cmd = CommandSpec::new(latexmk)
            .args([
                engine.latexmk_flag(),
                "-synctex=1",
                "-interaction=nonstopmode",
                "-file-line-error",
                "-halt-on-error",
            ])
            .arg(prefixed("-outdir=", &job.dir))
            .arg(format!("-jobname={}", job.name))
            .arg(source)
            .workdir(&job.dir);

        match self.runner.run(&cmd, deadline).await {
            Ok(_) => Ok(()),
            Err(RunnerError::NonZeroExit { output, .. }) => Err(LatexError::DriverFailed {
                tail: tail(&output, self.options.tail_chars).to_string(),
            }),
            Err(e) => Err(self.map_runner_error(e, String::new())),
        }
    }

    async fn run_passes(
        &self,
        binary: &Path,
        engine: Engine,
        job: &Job,
        source: &Path,
        deadline: &Deadline,
    ) -> LatexResult<()> {
        let cmd = CommandSpec::new(binary)
            .args([
                "-synctex=1",
                "-interaction=nonstopmode",
                "-file-line-error",
                "-recorder",
                "-halt-on-error",
                "-jobname",
            ])
            .arg(&job.name)
            .arg("-output-directory")
            .arg(&job.dir)
            .arg(source)
            .workdir(&job.dir);

        let mut combined = String::new();
        for pass in 1..=self.options.max_passes {
            debug!("{} pass {}/{}", engine, pass, self.options.max_passes);
            match self.runner.run(&cmd, deadline).await {
                Ok(result) => combined.push_str(&result.output),
                Err(RunnerError::NonZeroExit { output, .. }) => {
                    combined.push_str(&output);
                    return Err(LatexError::PassFailed {
                        engine,
                        pass,
                        tail: tail(&combined, self.options.tail_chars).to_string(),
                    });
                }
                Err(e) => return Err(self.map_runner_error(e, combined)),
            }
        }
        Ok(())
    }

    fn map_runner_error(&self, error: RunnerError, mut combined: String) -> LatexError {
        match error {
            RunnerError::Timeout {
                seconds, output, ..
            } => {
                combined.push_str(&output);
                LatexError::Timeout {
                    seconds,
                    tail: tail(&combined, self.options.tail_chars).to_string(),
                }
            }
            other => LatexError::Runner(other),
        }
    }
}

fn prefixed(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path);
    arg
}

/// The last `n` characters of `s`.
pub fn tail(s: &str, n: usize) -> &str {
    match s.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((start, _)) if n > 0 => &s[start..],
        _ if n == 0 => "",
        _ => s,
    }
}
