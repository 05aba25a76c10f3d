//! # serverci_runner
//!
//! Deadline-bound execution of external programs for serverci.
//!
//! This crate runs the TeX toolchain: it resolves programs on a search path,
//! captures their combined output and terminates them when a deadline passes.
//!
//! # Features
//!
//! - **System Runner**: `tokio::process` with process-group termination on Unix
//! - **Search Path Override**: search an explicit directory list instead of `PATH`
//! - **Shared Deadlines**: one [`Deadline`] spans any number of runs
//! - **Mock Runner**: For testing without an installed toolchain
//!
//! # Example
//!
//! ```rust,no_run
//! use serverci_runner::{CommandSpec, Deadline, ProcessRunner, SystemRunner, SystemRunnerOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = SystemRunner::new(SystemRunnerOptions::default());
//!
//!     let Some(latexmk) = runner.locate("latexmk") else {
//!         return Ok(());
//!     };
//!     let cmd = CommandSpec::new(latexmk).arg("-v");
//!     let result = runner.run(&cmd, &Deadline::after_secs(10)).await?;
//!     println!("{}", result.output);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mock;
pub mod runner;
pub mod system;

pub use config::{CommandSpec, Deadline};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use runner::{ProcessOutput, ProcessRunner};
pub use system::{SystemRunner, SystemRunnerOptions};
