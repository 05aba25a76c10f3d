//! # serverci_latex
//!
//! LaTeX compilation for serverci.
//!
//! Given rendered source bytes and an output path, [`LatexCompiler`] picks
//! an engine from the source's `%!TEX TS-program` directive, prefers
//! `latexmk` when installed, falls back to running the engine itself for up
//! to three passes, and removes auxiliary files once the PDF exists.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use serverci_latex::LatexCompiler;
//! use serverci_runner::{Deadline, SystemRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let compiler = LatexCompiler::new(Arc::new(SystemRunner::default()));
//!     let source = b"\\documentclass{article}\\begin{document}Hi\\end{document}";
//!     let pdf = compiler
//!         .compile(source, Path::new("out/hello.pdf"), &Deadline::after_secs(120))
//!         .await?;
//!     println!("{}", pdf.display());
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod engine;
pub mod error;
pub mod job;

pub use compiler::{tail, CompileOptions, LatexCompiler, Toolchain, LATEXMK};
pub use engine::Engine;
pub use error::{LatexError, LatexResult};
pub use job::{Job, AUX_EXTENSIONS};
