//! Validate command - Decode and validate a document.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use serverci_model::{DocumentReader, DocumentValidator};

use crate::pipeline::PipelineError;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document to validate (.json is read as JSON, anything else as YAML)
    #[arg(short, long)]
    pub input: PathBuf,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating document: {}", args.input.display());

    let document = DocumentReader::read_file(&args.input).map_err(PipelineError::from)?;
    let report = DocumentValidator::validate(&document);

    if report.is_valid() {
        println!("✅ {} is valid", args.input.display());
        return Ok(());
    }

    println!("❌ {} finding(s) in {}:", report.len(), args.input.display());
    for finding in report.findings() {
        println!("   - {}", finding);
    }
    report.into_result().map_err(PipelineError::from)?;
    Ok(())
}
