use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::domain::Job;
use crate::presentation::state::AppState;

/// One row in the job-history listing. Transcript and summary bodies are
/// omitted; clients fetch them through the status endpoint.
#[derive(Serialize)]
pub struct JobSummaryResponse {
    pub id: String,
    pub filename: String,
    pub status: String,
    pub progress: u8,
    pub status_message: Option<String>,
    pub error: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<Job> for JobSummaryResponse {
    fn from(job: Job) -> Self {
        Self {
            id: job.id.to_string(),
            filename: job.filename,
            status: job.status.as_str().to_string(),
            progress: job.progress,
            status_message: job.status_message,
            error: job.error,
            created_at: job.created_at.to_rfc3339(),
            completed_at: job.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_jobs_handler(State(state): State<AppState>) -> impl IntoResponse {
    let jobs: Vec<JobSummaryResponse> = state
        .registry
        .list()
        .into_iter()
        .map(JobSummaryResponse::from)
        .collect();

    (StatusCode::OK, Json(jobs))
}
