//! Render command - Validate, render and compile one document.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::commands::PipelineArgs;
use crate::pipeline::{timestamped_name, Pipeline};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Document to render (.json is read as JSON, anything else as YAML)
    #[arg(short, long)]
    pub input: PathBuf,

    /// LaTeX template
    #[arg(short, long)]
    pub template: PathBuf,

    /// Also write the rendered LaTeX source here
    #[arg(long, value_name = "FILE")]
    pub tex_out: Option<PathBuf>,

    /// Output PDF path (defaults to doc_<timestamp>.pdf in the current directory)
    #[arg(long, value_name = "PATH")]
    pub pdf_out: Option<PathBuf>,

    /// Stop after rendering
    #[arg(long)]
    pub no_compile: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

pub async fn execute(args: RenderArgs) -> Result<()> {
    let pipeline = Pipeline::new(&args.pipeline.config())?;

    info!("Reading document: {}", args.input.display());
    let document = pipeline.read_document(&args.input)?;
    pipeline.validate(&document)?;

    let template = std::fs::read(&args.template)
        .with_context(|| format!("Failed to read template {}", args.template.display()))?;
    let source = pipeline.render(&template, &document)?;

    if let Some(tex_out) = &args.tex_out {
        std::fs::write(tex_out, &source)
            .with_context(|| format!("Failed to write {}", tex_out.display()))?;
        info!("LaTeX source written to {}", tex_out.display());
    }

    if args.no_compile {
        println!("✅ Rendered {} ({} bytes)", args.template.display(), source.len());
        return Ok(());
    }

    let output = args
        .pdf_out
        .clone()
        .unwrap_or_else(|| PathBuf::from(timestamped_name()));
    let pdf = pipeline.compile(&source, &output).await?;

    println!("✅ PDF written to {}", pdf.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineError;
    use crate::ExitCodes;

    const DOCUMENT: &str = r#"
ci:
  author-company: ACME Corp
  configuration:
    fqdn: srv01.corp.example
  interfaces:
    - name: eth0
      dhcp: true
"#;

    fn args(dir: &std::path::Path, template: &str) -> RenderArgs {
        let input = dir.join("ci.yaml");
        let tmpl = dir.join("doc.tex");
        std::fs::write(&input, DOCUMENT).unwrap();
        std::fs::write(&tmpl, template).unwrap();
        RenderArgs {
            input,
            template: tmpl,
            tex_out: Some(dir.join("out.tex")),
            pdf_out: None,
            no_compile: true,
            pipeline: PipelineArgs {
                strict: true,
                lenient: false,
                timeout: 5,
                tex_path: Some(dir.as_os_str().to_owned()),
            },
        }
    }

    #[tokio::test]
    async fn test_render_without_compile() {
        let dir = tempfile::tempdir().unwrap();
        let template = "\\title{<<ci.configuration.fqdn>>}\n<<range ci.interfaces>>\\item <<upper .name>>\n<<end>>";
        execute(args(dir.path(), template)).await.unwrap();

        let tex = std::fs::read_to_string(dir.path().join("out.tex")).unwrap();
        assert_eq!(tex, "\\title{srv01.corp.example}\n\\item ETH0\n");
    }

    #[tokio::test]
    async fn test_missing_key_is_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(args(dir.path(), "<<ci.configuration.hostname>>"))
            .await
            .unwrap_err();
        let err = err.downcast_ref::<PipelineError>().unwrap();
        assert_eq!(err.exit_code(), ExitCodes::TEMPLATE_ERROR);
        assert!(!dir.path().join("out.tex").exists());
    }

    #[tokio::test]
    async fn test_compile_without_toolchain() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path(), "\\documentclass{article}");
        args.no_compile = false;
        args.pdf_out = Some(dir.path().join("doc.pdf"));

        let err = execute(args).await.unwrap_err();
        let err = err.downcast_ref::<PipelineError>().unwrap();
        assert_eq!(err.exit_code(), ExitCodes::COMPILE_ERROR);
    }
}
