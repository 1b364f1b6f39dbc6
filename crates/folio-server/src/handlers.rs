//! HTTP request handlers for the Folio service.
//!
//! Upload, status, download and cleanup endpoints using axum.

use crate::orchestrator::{Orchestrator, OrchestratorError, Upload};
use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use folio_domain::JobSummary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator behind every route
    pub orchestrator: Arc<Orchestrator>,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

/// Upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Always true
    pub success: bool,
    /// Job identifier for later status and download calls
    pub extraction_id: String,
    /// Extraction summary
    pub results: JobSummary,
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always true
    pub success: bool,
    /// Extraction summary including its timestamp
    pub results: JobSummary,
}

/// Cleanup response
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    /// Always true
    pub success: bool,
    /// Number of jobs evicted
    pub cleaned: usize,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Number of live jobs
    pub jobs: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Error from the orchestrator
    Orchestrator(OrchestratorError),
    /// Malformed or oversized multipart body
    Multipart(MultipartError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Orchestrator(e) => {
                let status = match &e {
                    OrchestratorError::Validation(_) => StatusCode::BAD_REQUEST,
                    OrchestratorError::NotFound(_) | OrchestratorError::NoArtifacts => {
                        StatusCode::NOT_FOUND
                    }
                    OrchestratorError::Engine(_)
                    | OrchestratorError::Upload(_)
                    | OrchestratorError::Download(_)
                    | OrchestratorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!("Request failed: {}", e);
                }
                (status, e.to_string())
            }
            AppError::Multipart(e) => (e.status(), format!("Upload error: {}", e.body_text())),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<OrchestratorError> for AppError {
    fn from(e: OrchestratorError) -> Self {
        AppError::Orchestrator(e)
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Multipart(e)
    }
}

/// `attachment` disposition with a quoted, header-safe file name
fn attachment(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

/// POST /upload - Run an extraction on a multipart `file` with an `api_key`
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file = None;
    let mut api_key = String::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let contents = field.bytes().await?;
                file = Some(Upload { file_name, contents });
            }
            "api_key" => {
                api_key = field.text().await?;
            }
            _ => {}
        }
    }

    let created = state.orchestrator.create_job(file, &api_key).await?;

    Ok(Json(UploadResponse {
        success: true,
        extraction_id: created.id.to_string(),
        results: created.summary,
    }))
}

/// GET /status/:id - Summary of a live job
async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let results = state.orchestrator.get_job(&id)?;
    Ok(Json(StatusResponse {
        success: true,
        results,
    }))
}

/// GET /download/:id - Every artifact of a job as one zip archive
async fn download_bundle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let archive = state.orchestrator.download_bundle(&id).await?;
    let disposition = attachment(archive.file_name());
    let size = archive.size();

    let stream = archive
        .into_stream()
        .await
        .map_err(|e| OrchestratorError::Download(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// GET /download_csv/:id/:filename - One artifact of a job
async fn download_artifact(
    State(state): State<AppState>,
    Path((id, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let artifact = state.orchestrator.download_artifact(&id, &filename).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, attachment(&artifact.file_name)),
            (header::CONTENT_LENGTH, artifact.size.to_string()),
        ],
        Body::from_stream(ReaderStream::new(artifact.file)),
    )
        .into_response())
}

/// GET|POST /cleanup - Evict expired jobs now
async fn cleanup(State(state): State<AppState>) -> Result<Json<CleanupResponse>, AppError> {
    let cleaned = state.orchestrator.sweep().await?;
    Ok(Json(CleanupResponse {
        success: true,
        cleaned,
    }))
}

/// GET /health - Liveness check
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        jobs: state.orchestrator.job_count(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    let upload_limit = state.max_upload_bytes;

    AxumRouter::new()
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/status/:id", get(status))
        .route("/download/:id", get(download_bundle))
        .route("/download_csv/:id/:filename", get(download_artifact))
        .route("/cleanup", get(cleanup).post(cleanup))
        .route("/health", get(health_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_header() {
        assert_eq!(attachment("a.zip"), "attachment; filename=\"a.zip\"");
        assert_eq!(attachment("we\"ird\n.csv"), "attachment; filename=\"we_ird_.csv\"");
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (OrchestratorError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (OrchestratorError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (OrchestratorError::NoArtifacts, StatusCode::NOT_FOUND),
            (
                OrchestratorError::Engine(folio_engine::EngineError::InvalidCredential),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (OrchestratorError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            let response = AppError::from(error).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
