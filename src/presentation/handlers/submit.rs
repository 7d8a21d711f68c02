use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Accepts a media upload, stages it on disk, and enqueues a summarization
/// job. The staged file is owned by the job from this point on and is removed
/// on every exit path of its pipeline run.
#[tracing::instrument(skip(state, multipart))]
pub async fn submit_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut field = match multipart.next_field().await {
        Ok(Some(f)) => f,
        Ok(None) => {
            tracing::warn!("Submission with no file");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "No file uploaded".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read multipart");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Failed to read multipart: {}", e),
                }),
            )
                .into_response();
        }
    };

    let filename = sanitize_filename(field.file_name().unwrap_or("upload"));
    tracing::debug!(filename = %filename, "Receiving file upload");

    if let Err(e) = tokio::fs::create_dir_all(&state.uploads_dir).await {
        tracing::error!(error = %e, "Failed to create uploads directory");
        return internal_error();
    }

    let staged_path = state
        .uploads_dir
        .join(format!("{}_{}", Uuid::new_v4(), filename));

    let mut file = match tokio::fs::File::create(&staged_path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create staged file");
            return internal_error();
        }
    };

    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = file.write_all(&chunk).await {
                    tracing::error!(error = %e, "Failed to write staged file");
                    let _ = tokio::fs::remove_file(&staged_path).await;
                    return internal_error();
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read upload body");
                let _ = tokio::fs::remove_file(&staged_path).await;
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: format!("Failed to read file: {}", e),
                    }),
                )
                    .into_response();
            }
        }
    }

    if let Err(e) = file.flush().await {
        tracing::error!(error = %e, "Failed to flush staged file");
        let _ = tokio::fs::remove_file(&staged_path).await;
        return internal_error();
    }
    drop(file);

    match state.registry.submit(filename, staged_path.clone()).await {
        Ok(job_id) => (
            StatusCode::ACCEPTED,
            Json(SubmitResponse {
                job_id: job_id.to_string(),
                message: "Processing started".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Submission rejected");
            let _ = tokio::fs::remove_file(&staged_path).await;
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: "Processing queue is full. Try again later.".to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Failed to store the uploaded file".to_string(),
        }),
    )
        .into_response()
}

/// Keep only characters that are safe in a filesystem path component.
fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('_').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_filename;

    #[test]
    fn test_sanitize_strips_path_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("team call.mp4"), "team_call.mp4");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_filename("///"), "upload");
    }
}
