use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use recapd::application::ports::{
    HistoryStore, HistoryStoreError, MediaConverter, MediaError, SpeechError, SpeechRequest,
    Summarizer, Transcriber,
};
use recapd::application::services::{JobPipeline, JobRegistry, PipelineConfig, WorkerPool};
use recapd::domain::{ChunkSpan, Job, JobId, JobStatus, NormalizedMedia};
use recapd::infrastructure::persistence::JsonSettingsStore;
use recapd::presentation::{create_router, AppState};

struct MockHistoryStore;

#[async_trait::async_trait]
impl HistoryStore for MockHistoryStore {
    async fn save(&self, _job: &Job) -> Result<(), HistoryStoreError> {
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Job>, HistoryStoreError> {
        Ok(vec![])
    }

    async fn load_by_id(&self, _id: JobId) -> Result<Option<Job>, HistoryStoreError> {
        Ok(None)
    }

    async fn delete(&self, _id: JobId) -> Result<(), HistoryStoreError> {
        Ok(())
    }
}

struct MockConverter;

#[async_trait::async_trait]
impl MediaConverter for MockConverter {
    async fn normalize(
        &self,
        _source: &Path,
        scratch_dir: &Path,
    ) -> Result<NormalizedMedia, MediaError> {
        Ok(NormalizedMedia {
            path: scratch_dir.join("normalized.mp3"),
            duration_secs: 90.0,
        })
    }

    async fn slice(
        &self,
        _media: &NormalizedMedia,
        span: ChunkSpan,
        scratch_dir: &Path,
    ) -> Result<PathBuf, MediaError> {
        Ok(scratch_dir.join(format!("chunk_{:03}.mp3", span.index)))
    }
}

struct MockTranscriber;

#[async_trait::async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        _audio: &Path,
        _request: SpeechRequest<'_>,
    ) -> Result<String, SpeechError> {
        Ok("word for word".to_string())
    }
}

struct MockSummarizer;

#[async_trait::async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(
        &self,
        _transcript: &str,
        _request: SpeechRequest<'_>,
    ) -> Result<String, SpeechError> {
        Ok("the executive summary".to_string())
    }
}

struct TestApp {
    router: Router,
    registry: Arc<JobRegistry>,
    _data_dir: tempfile::TempDir,
}

async fn test_app() -> TestApp {
    let data_dir = tempfile::tempdir().unwrap();
    let settings_store =
        Arc::new(JsonSettingsStore::new(data_dir.path().join("settings.json")).unwrap());

    let (registry, receiver) = JobRegistry::with_capacity(Arc::new(MockHistoryStore), 8);

    let pipeline = Arc::new(JobPipeline::new(
        Arc::clone(&registry),
        Arc::new(MockConverter),
        Arc::new(MockTranscriber),
        Arc::new(MockSummarizer),
        settings_store.clone(),
        PipelineConfig {
            inter_call_delay: Duration::ZERO,
        },
    ));
    WorkerPool::spawn(2, receiver, pipeline);

    let state = AppState {
        registry: Arc::clone(&registry),
        settings_store,
        uploads_dir: data_dir.path().join("uploads"),
    };

    TestApp {
        router: create_router(state),
        registry,
        _data_dir: data_dir,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_upload(filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: video/mp4\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/jobs")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn given_running_service_when_health_checked_then_healthy() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn given_unknown_job_when_polling_then_not_found() {
    let app = test_app().await;
    let uri = format!("/api/v1/jobs/{}", JobId::new());

    let response = app
        .router
        .clone()
        .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn given_malformed_job_id_when_polling_then_bad_request() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/api/v1/jobs/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_no_jobs_when_listing_then_empty_array() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/v1/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn given_defaults_when_reading_settings_then_api_key_not_exposed() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/v1/settings").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["model"], "gemini-2.5-flash");
    assert_eq!(json["max_duration_seconds"], 3600);
    assert_eq!(json["api_key_set"], false);
    assert!(json.get("api_key").is_none());
}

#[tokio::test]
async fn given_partial_update_when_saving_settings_then_persisted() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::put("/api/v1/settings")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"model": "gemini-exp", "api_key": "secret"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["model"], "gemini-exp");
    assert_eq!(json["api_key_set"], true);

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/api/v1/settings").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["model"], "gemini-exp");
    assert_eq!(json["max_duration_seconds"], 3600);
}

#[tokio::test]
async fn given_upload_when_submitted_then_job_runs_to_completion() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_upload("standup.mp4", b"fake media bytes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    let job_id = JobId::from_uuid(json["job_id"].as_str().unwrap().parse().unwrap());

    // Poll the registry until the worker drives the job to a terminal state.
    let mut job = None;
    for _ in 0..500 {
        if let Some(snapshot) = app.registry.snapshot(job_id) {
            if snapshot.is_terminal() {
                job = Some(snapshot);
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let job = job.expect("job did not reach a terminal state");
    assert_eq!(job.status, JobStatus::Completed);

    let uri = format!("/api/v1/jobs/{}", job_id);
    let response = app
        .router
        .clone()
        .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "COMPLETED");
    assert_eq!(json["progress"], 100);
    assert_eq!(json["transcript"], "word for word");
    assert_eq!(json["summary"], "the executive summary");
    assert_eq!(json["error"], serde_json::Value::Null);
}

#[tokio::test]
async fn given_completed_job_when_deleted_then_hidden_from_history() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_upload("standup.mp4", b"fake media bytes"))
        .await
        .unwrap();
    let json = body_json(response).await;
    let job_id: String = json["job_id"].as_str().unwrap().to_string();

    for _ in 0..500 {
        if let Some(snapshot) = app
            .registry
            .snapshot(JobId::from_uuid(job_id.parse().unwrap()))
        {
            if snapshot.is_terminal() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let uri = format!("/api/v1/jobs/{}", job_id);
    let response = app
        .router
        .clone()
        .oneshot(Request::delete(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .router
        .clone()
        .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn given_non_multipart_post_when_submitting_then_bad_request() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::post("/api/v1/jobs")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
