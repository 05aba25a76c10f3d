//! CLI command definitions.
//!
//! This module defines the command structure for the serverci CLI.
//! Each subcommand maps to one way of running the document pipeline.

use std::ffi::OsString;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::pipeline::PipelineConfig;

pub mod render;
pub mod serve;
pub mod validate;

/// serverci - configuration-item documents to PDF
#[derive(Parser)]
#[command(name = "serverci")]
#[command(version, about = "serverci - render configuration-item documents to PDF")]
#[command(long_about = r#"
serverci validates a configuration-item document (YAML or JSON), merges it into
a LaTeX template and compiles the result to PDF with latexmk or a TeX engine.

COMMANDS:
  render    → Validate, render and compile one document
  validate  → Decode and validate a document, listing every finding
  serve     → Run the HTTP server (POST / with multipart form data)

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Decode or validation failure
  4 - Template error
  5 - Compile error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, env = "SERVERCI_LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a document through a template and compile it to PDF
    Render(render::RenderArgs),

    /// Validate a document
    Validate(validate::ValidateArgs),

    /// Run the HTTP server
    Serve(serve::ServeArgs),
}

/// Options shared by the commands that render and compile.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Fail on template placeholders with no matching field (default)
    #[arg(long, env = "SERVERCI_STRICT", default_value_t = true, num_args = 0..=1, default_missing_value = "true", action = clap::ArgAction::Set)]
    pub strict: bool,

    /// Render unresolved placeholders as empty text
    #[arg(long)]
    pub lenient: bool,

    /// Compilation timeout in seconds
    #[arg(long, env = "SERVERCI_TIMEOUT", default_value_t = 120, value_name = "SECS")]
    pub timeout: u64,

    /// Directories searched for latexmk and the TeX engines, in PATH syntax
    #[arg(long, env = "SERVERCI_TEX_PATH", value_name = "DIRS")]
    pub tex_path: Option<OsString>,
}

impl PipelineArgs {
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig {
            strict: self.strict && !self.lenient,
            timeout: Duration::from_secs(self.timeout),
            tex_path: self.tex_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_args(args: &[&str]) -> render::RenderArgs {
        let mut argv = vec!["serverci", "render", "-i", "ci.yaml", "-t", "doc.tex"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Render(args) => args,
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_pipeline_defaults() {
        let config = render_args(&[]).pipeline.config();
        assert!(config.strict);
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.tex_path.is_none());
    }

    #[test]
    fn test_lenient_and_timeout() {
        let config = render_args(&["--lenient", "--timeout", "30"]).pipeline.config();
        assert!(!config.strict);
        assert_eq!(config.timeout, Duration::from_secs(30));

        let config = render_args(&["--strict", "false"]).pipeline.config();
        assert!(!config.strict);
    }

    #[test]
    fn test_log_format() {
        let cli =
            Cli::try_parse_from(["serverci", "--log-format", "json", "validate", "-i", "a.yaml"])
                .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_missing_required_argument() {
        let err = Cli::try_parse_from(["serverci", "render", "-i", "ci.yaml"]).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }
}
