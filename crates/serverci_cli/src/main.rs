//! serverci CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Decode or validation failure
//! - 4: Template error
//! - 5: Compile error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod pipeline;

use commands::{Cli, Commands, LogFormat};
use pipeline::PipelineError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
    pub const COMPILE_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Render(args) => commands::render::execute(args).await,
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Serve(args) => commands::serve::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn default_filter(cli: &Cli) -> &'static str {
    if cli.verbose {
        "serverci=debug,tower_http=debug,info"
    } else if cli.quiet {
        "warn"
    } else {
        "serverci=info,tower_http=info,warn"
    }
}

fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(cli)));
    let registry = tracing_subscriber::registry().with(filter);

    let log_result = match cli.log_format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Map an error to its exit code by the pipeline step that failed.
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<PipelineError>() {
        Some(err) => err.exit_code(),
        None => ExitCodes::GENERAL_ERROR,
    }
}
