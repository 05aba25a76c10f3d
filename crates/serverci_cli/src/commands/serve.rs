//! Serve command - HTTP front end for the document pipeline.
//!
//! Routes:
//! - `POST /` - multipart form with the document as file `ci_yaml` (YAML) or
//!   field `ci` (JSON), and the LaTeX template as file `template`; responds
//!   with the compiled PDF
//! - `GET /health` - liveness check

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use clap::Args;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use serverci_model::InputFormat;

use crate::commands::PipelineArgs;
use crate::pipeline::{timestamped_name, Pipeline, PipelineError};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 << 20;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "SERVERCI_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// Directory compiled PDFs are written to before being sent (defaults to the current directory)
    #[arg(long, env = "SERVERCI_OUTPUT_DIR", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Seconds to wait for in-flight requests on shutdown
    #[arg(long, default_value_t = 5, value_name = "SECS")]
    pub shutdown_timeout: u64,

    /// Maximum request body size
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, value_name = "BYTES")]
    pub max_upload_bytes: usize,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    output_dir: PathBuf,
    job_name: fn() -> String,
}

impl AppState {
    pub fn new(pipeline: Pipeline, output_dir: PathBuf) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            output_dir,
            job_name: unique_job_name,
        }
    }
}

/// `doc_<timestamp>_<random>`; unique across concurrent requests.
fn unique_job_name() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", timestamped_name(), &suffix[..8])
}

/// Creates the router with all endpoints.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", post(generate))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let pipeline = Pipeline::new(&args.pipeline.config())?;
    let app = router(AppState::new(pipeline, output_dir), args.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.addr))?;
    info!("Starting server on {}", listener.local_addr()?);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = stop_tx.send(());
            })
            .await
    });

    let grace = Duration::from_secs(args.shutdown_timeout);
    let drain_limit = async {
        if stop_rx.await.is_ok() {
            info!("Shutting down gracefully (timeout {}s)", grace.as_secs());
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        served = server => served.context("Server task failed")?.context("Server error")?,
        _ = drain_limit => warn!("Shutdown timeout elapsed, dropping open connections"),
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// API error responses, as plain text.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    BadRequest(String),
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Pipeline(err) => {
                let status = match &err {
                    PipelineError::Compile(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
                    PipelineError::Compile(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    PipelineError::Decode(_)
                    | PipelineError::Validation(_)
                    | PipelineError::Template(_)
                    | PipelineError::MissingInput(_) => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, message);
        } else {
            warn!("Request rejected ({}): {}", status, message);
        }
        (status, message).into_response()
    }
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// Parts of the upload form.
#[derive(Default)]
struct Upload {
    yaml: Option<Vec<u8>>,
    json: Option<String>,
    template: Option<Vec<u8>>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        ApiError::BadRequest(format!("Error parsing form: {e}"))
    };

    let mut upload = Upload::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "ci_yaml" => upload.yaml = Some(field.bytes().await.map_err(bad_form)?.to_vec()),
            "ci" => upload.json = Some(field.text().await.map_err(bad_form)?),
            "template" => upload.template = Some(field.bytes().await.map_err(bad_form)?.to_vec()),
            _ => {}
        }
    }
    Ok(upload)
}

/// POST / - document and template in, PDF out
async fn generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = read_upload(multipart).await?;
    let pipeline = &state.pipeline;

    let document = match (&upload.yaml, &upload.json) {
        (Some(yaml), _) => {
            let yaml = std::str::from_utf8(yaml)
                .map_err(|e| ApiError::BadRequest(format!("Invalid YAML: {e}")))?;
            pipeline.decode(yaml, InputFormat::Yaml)?
        }
        (None, Some(json)) if !json.trim().is_empty() => {
            pipeline.decode(json, InputFormat::Json)?
        }
        _ => {
            return Err(PipelineError::MissingInput(
                "Missing values: provide either YAML file 'ci_yaml' or JSON field 'ci'".to_string(),
            )
            .into())
        }
    };
    pipeline.validate(&document)?;

    let template = upload.template.ok_or_else(|| {
        PipelineError::MissingInput("Missing file 'template'".to_string())
    })?;
    let source = pipeline.render(&template, &document)?;

    let job = (state.job_name)();
    let output = state.output_dir.join(format!("{job}.pdf"));
    let pdf = pipeline.compile(&source, &output).await?;

    let bytes = tokio::fs::read(&pdf).await;
    if let Err(e) = tokio::fs::remove_file(&pdf).await {
        warn!("Failed to remove {}: {}", pdf.display(), e);
    }
    let bytes =
        bytes.map_err(|e| ApiError::Internal(format!("error opening compiled pdf: {e}")))?;

    info!("Served {}.pdf ({} bytes)", job, bytes.len());
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{job}.pdf\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
