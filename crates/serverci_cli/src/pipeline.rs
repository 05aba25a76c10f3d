//! The validate, render and compile steps shared by every command.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use serverci_latex::{LatexCompiler, LatexError};
use serverci_model::{Document, DocumentReader, InputFormat, ModelError, ValidationErrors};
use serverci_runner::{Deadline, ProcessRunner, SystemRunner, SystemRunnerOptions};
use serverci_templates::{TemplateError, TemplateRenderer};

use crate::ExitCodes;

/// A failed pipeline step.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{0}")]
    Decode(#[from] ModelError),

    #[error("ci validation error:\n{0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error("tex compilation error: {0}")]
    Compile(#[from] LatexError),

    #[error("{0}")]
    MissingInput(String),
}

impl PipelineError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Decode(ModelError::Read { .. }) => ExitCodes::GENERAL_ERROR,
            Self::Decode(_) | Self::Validation(_) => ExitCodes::VALIDATION_FAILURE,
            Self::Template(_) => ExitCodes::TEMPLATE_ERROR,
            Self::Compile(_) => ExitCodes::COMPILE_ERROR,
            Self::MissingInput(_) => ExitCodes::INVALID_ARGS,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Settings for building a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub strict: bool,
    pub timeout: Duration,
    pub tex_path: Option<OsString>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strict: true,
            timeout: Duration::from_secs(120),
            tex_path: None,
        }
    }
}

/// Document in, PDF out.
pub struct Pipeline {
    renderer: TemplateRenderer,
    compiler: LatexCompiler,
    timeout: Duration,
}

impl Pipeline {
    /// A pipeline that compiles with the installed toolchain.
    pub fn new(config: &PipelineConfig) -> PipelineResult<Self> {
        let mut options = SystemRunnerOptions::new();
        if let Some(path) = &config.tex_path {
            options = options.search_path(path.clone());
        }
        Self::with_runner(Arc::new(SystemRunner::new(options)), config)
    }

    pub fn with_runner(
        runner: Arc<dyn ProcessRunner>,
        config: &PipelineConfig,
    ) -> PipelineResult<Self> {
        let renderer = if config.strict {
            TemplateRenderer::strict()
        } else {
            TemplateRenderer::lenient()
        };
        Ok(Self {
            renderer: renderer.with_schema(&Document::skeleton())?,
            compiler: LatexCompiler::new(runner),
            timeout: config.timeout,
        })
    }

    pub fn read_document(&self, path: &Path) -> PipelineResult<Document> {
        Ok(DocumentReader::read_file(path)?)
    }

    pub fn decode(&self, content: &str, format: InputFormat) -> PipelineResult<Document> {
        Ok(DocumentReader::decode(content, format)?)
    }

    pub fn validate(&self, document: &Document) -> PipelineResult<()> {
        Ok(document.validate()?)
    }

    pub fn render(&self, template: &[u8], document: &Document) -> PipelineResult<Vec<u8>> {
        Ok(self.renderer.render_reader(template, document)?)
    }

    /// Compile under a fresh deadline of the configured timeout.
    pub async fn compile(&self, source: &[u8], output: &Path) -> PipelineResult<PathBuf> {
        let deadline = Deadline::after(self.timeout);
        let pdf = self.compiler.compile(source, output, &deadline).await?;
        info!("PDF written to {}", pdf.display());
        Ok(pdf)
    }
}

/// `doc_<YYYYmmdd_HHMMSS>`, the default output name.
pub fn timestamped_name() -> String {
    format!("doc_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}
