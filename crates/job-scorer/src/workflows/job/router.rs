use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::pipeline::PipelineFailure;
use super::record::JobId;
use super::repository::JobRepository;
use super::service::{JobService, JobServiceError};
use crate::workflows::scope::SourceFile;
use crate::workflows::scoring::ModelClient;

const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// One spreadsheet inside a job submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub content_base64: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSubmission {
    pub files: Vec<UploadedFile>,
}

impl JobSubmission {
    pub fn from_sources(files: &[SourceFile]) -> Self {
        Self {
            files: files
                .iter()
                .map(|file| UploadedFile {
                    filename: file.filename.clone(),
                    content_base64: STANDARD.encode(&file.bytes),
                })
                .collect(),
        }
    }

    fn into_sources(self) -> Result<Vec<SourceFile>, String> {
        if self.files.is_empty() {
            return Err("at least one file is required".to_string());
        }
        self.files
            .into_iter()
            .map(|file| {
                let bytes = STANDARD
                    .decode(file.content_base64.trim())
                    .map_err(|err| format!("{}: invalid base64 content ({err})", file.filename))?;
                Ok(SourceFile::new(file.filename, bytes))
            })
            .collect()
    }
}

/// Router builder exposing job scoring and lookup endpoints.
pub fn job_router<C, R>(service: Arc<JobService<C, R>>) -> Router
where
    C: ModelClient + 'static,
    R: JobRepository + 'static,
{
    Router::new()
        .route("/api/v1/jobs", post(create_handler::<C, R>))
        .route("/api/v1/jobs/summary", post(summary_handler::<C, R>))
        .route("/api/v1/jobs/:job_id", get(fetch_handler::<C, R>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

pub(crate) async fn create_handler<C, R>(
    State(service): State<Arc<JobService<C, R>>>,
    Json(submission): Json<JobSubmission>,
) -> Response
where
    C: ModelClient + 'static,
    R: JobRepository + 'static,
{
    let files = match submission.into_sources() {
        Ok(files) => files,
        Err(message) => return bad_request(message),
    };

    match service.score(files).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn summary_handler<C, R>(
    State(service): State<Arc<JobService<C, R>>>,
    Json(submission): Json<JobSubmission>,
) -> Response
where
    C: ModelClient + 'static,
    R: JobRepository + 'static,
{
    let files = match submission.into_sources() {
        Ok(files) => files,
        Err(message) => return bad_request(message),
    };

    match service.summarize(&files) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn fetch_handler<C, R>(
    State(service): State<Arc<JobService<C, R>>>,
    Path(job_id): Path<String>,
) -> Response
where
    C: ModelClient + 'static,
    R: JobRepository + 'static,
{
    let Some(id) = JobId::parse(&job_id) else {
        let payload = json!({ "error": format!("job {job_id} not found") });
        return (StatusCode::NOT_FOUND, Json(payload)).into_response();
    };

    match service.get(&id) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

fn bad_request(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn error_response(err: JobServiceError) -> Response {
    let status = match &err {
        JobServiceError::Pipeline(failure) => match failure.failure {
            PipelineFailure::NoFiles => StatusCode::BAD_REQUEST,
            PipelineFailure::Schema(_) | PipelineFailure::NoUsableFiles(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PipelineFailure::Scoring(_) if failure.is_cancelled() => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PipelineFailure::Scoring(_) => StatusCode::BAD_GATEWAY,
            PipelineFailure::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        },
        JobServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        JobServiceError::NotFound(_) => StatusCode::NOT_FOUND,
    };

    let payload = match &err {
        JobServiceError::Pipeline(failure) => json!({
            "error": failure.failure.to_string(),
            "stage": failure.stage,
        }),
        other => json!({ "error": other.to_string() }),
    };
    (status, Json(payload)).into_response()
}
