//! Router and request handlers.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use framecast_common::clock::now_rfc3339;
use framecast_common::config::Environment;
use framecast_common::error::{FramecastError, FramecastResult};
use framecast_export_model::RawExportRequest;
use framecast_orchestrator::{ExportArtifact, ExportOrchestrator};

use crate::response::ApiError;

/// Shared handler state.
pub struct AppState {
    pub orchestrator: Arc<ExportOrchestrator>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(orchestrator: Arc<ExportOrchestrator>, environment: Environment) -> Self {
        Self {
            orchestrator,
            environment,
        }
    }

    fn api_error(&self, error: FramecastError) -> ApiError {
        ApiError::new(error, !self.environment.is_production())
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/export-video", post(export_video))
        .route("/health", get(health))
        .layer(middleware::from_fn(answer_options))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Any `OPTIONS` request is answered `200`, preflight or not.
async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    timestamp: String,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        timestamp: now_rfc3339(),
    })
}

async fn export_video(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    tracing::info!(bytes = body.len(), "Video export request received");
    tracing::debug!(body = %String::from_utf8_lossy(&body), "Export request body");

    let raw = match RawExportRequest::from_json(&body) {
        Ok(raw) => raw,
        Err(e) => {
            return state
                .api_error(FramecastError::validation(format!(
                    "request body must be a JSON object: {e}"
                )))
                .into_response()
        }
    };

    let artifact = match state.orchestrator.run(&raw).await {
        Ok(artifact) => artifact,
        Err(e) => return state.api_error(e).into_response(),
    };

    match stream_artifact(artifact).await {
        Ok(response) => response,
        Err(e) => state.api_error(e).into_response(),
    }
}

/// Stream the video file. The artifact rides along with the body stream,
/// so its file is deleted once the body finishes or the client goes away.
async fn stream_artifact(mut artifact: ExportArtifact) -> FramecastResult<Response> {
    let opened = tokio::fs::File::open(artifact.path()).await;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        artifact.filename()
    ));
    let (file, disposition) = match (opened, disposition) {
        (Ok(file), Ok(disposition)) => (file, disposition),
        (Err(e), _) => {
            artifact.mark_failed();
            return Err(e.into());
        }
        (_, Err(e)) => {
            artifact.mark_failed();
            return Err(FramecastError::Other(e.into()));
        }
    };
    let content_type = artifact.content_type();
    let size = artifact.size_bytes();

    tracing::info!(
        job_id = %artifact.job_id(),
        filename = %artifact.filename(),
        size_bytes = size,
        "Streaming export"
    );

    let stream = ReaderStream::new(file).map(move |chunk| {
        let _keep_until_sent = &artifact;
        chunk
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size)
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from_stream(stream))
        .map_err(|e| FramecastError::Other(e.into()))?;
    Ok(response)
}
