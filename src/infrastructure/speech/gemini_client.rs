use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::application::ports::{ApiFailure, SpeechError, SpeechRequest, Summarizer, Transcriber};
use crate::domain::RetryPolicy;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const AUDIO_MIME: &str = "audio/mpeg";

/// Client for the Gemini generation API, covering both transcription (audio
/// upload + generateContent) and summarization (text-only generateContent).
///
/// Media calls upload the audio, wait for the remote file to become ACTIVE,
/// generate, then delete the remote file. Transient failures (rate limiting,
/// timeouts, 5xx) are retried under the shared policy; anything else fails
/// immediately as a rejection.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    request_timeout: Duration,
    poll_interval: Duration,
    max_activation_polls: u32,
}

impl GeminiClient {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(600),
            poll_interval: Duration::from_secs(10),
            max_activation_polls: 60,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn transcribe_attempt(
        &self,
        audio_bytes: &[u8],
        request: SpeechRequest<'_>,
    ) -> Result<String, AttemptFailure> {
        let file = self.upload_file(audio_bytes, request.api_key).await?;
        let file = self.wait_until_active(file, request.api_key).await?;

        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": request.prompt },
                    { "file_data": { "mime_type": AUDIO_MIME, "file_uri": file.uri } }
                ]
            }]
        });

        let result = self.generate(request, &body).await;
        self.delete_file(&file.name, request.api_key).await;
        result
    }

    async fn upload_file(
        &self,
        audio_bytes: &[u8],
        api_key: &str,
    ) -> Result<RemoteFile, AttemptFailure> {
        let url = format!("{}/upload/v1beta/files?key={}", self.base_url, api_key);

        let part = multipart::Part::bytes(audio_bytes.to_vec())
            .file_name("audio.mp3")
            .mime_str(AUDIO_MIME)
            .map_err(|e| AttemptFailure::Fatal(format!("mime: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        tracing::debug!(bytes = audio_bytes.len(), "Uploading audio to Gemini");

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(classify_transport)?;
        let response = check_status(response).await?;

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| AttemptFailure::Fatal(format!("invalid upload response: {}", e)))?;

        Ok(upload.file)
    }

    /// Poll the uploaded file until the service reports it ACTIVE.
    async fn wait_until_active(
        &self,
        mut file: RemoteFile,
        api_key: &str,
    ) -> Result<RemoteFile, AttemptFailure> {
        let mut polls = 0;
        while file.state.as_deref() == Some("PROCESSING") {
            polls += 1;
            if polls > self.max_activation_polls {
                return Err(AttemptFailure::Transient(ApiFailure::Timeout));
            }
            tokio::time::sleep(self.poll_interval).await;

            let url = format!("{}/v1beta/{}?key={}", self.base_url, file.name, api_key);
            let response = self
                .http
                .get(&url)
                .timeout(self.request_timeout)
                .send()
                .await
                .map_err(classify_transport)?;
            let response = check_status(response).await?;
            file = response
                .json()
                .await
                .map_err(|e| AttemptFailure::Fatal(format!("invalid file status: {}", e)))?;

            tracing::debug!(file = %file.name, state = ?file.state, "Remote file state");
        }

        if file.state.as_deref() == Some("FAILED") {
            return Err(AttemptFailure::Fatal(
                "the service failed to process the uploaded media".to_string(),
            ));
        }

        Ok(file)
    }

    async fn generate(
        &self,
        request: SpeechRequest<'_>,
        body: &serde_json::Value,
    ) -> Result<String, AttemptFailure> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, request.model, request.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(body)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(classify_transport)?;
        let response = check_status(response).await?;

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AttemptFailure::Fatal(format!("invalid generation response: {}", e)))?;

        let text = generated.text();
        if text.is_empty() {
            return Err(AttemptFailure::Fatal(
                "the service returned an empty response".to_string(),
            ));
        }

        Ok(text)
    }

    /// Best-effort: a leaked remote file costs quota but never fails a job.
    async fn delete_file(&self, name: &str, api_key: &str) {
        let url = format!("{}/v1beta/{}?key={}", self.base_url, name, api_key);
        match self
            .http
            .delete(&url)
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(_) => tracing::debug!(file = %name, "Deleted remote file"),
            Err(e) => tracing::warn!(file = %name, error = %e, "Failed to delete remote file"),
        }
    }
}

#[async_trait]
impl Transcriber for GeminiClient {
    async fn transcribe(
        &self,
        audio: &Path,
        request: SpeechRequest<'_>,
    ) -> Result<String, SpeechError> {
        let audio_bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| SpeechError::Rejected(format!("could not read audio file: {}", e)))?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.transcribe_attempt(&audio_bytes, request).await {
                Ok(text) => return Ok(text.trim().to_string()),
                Err(AttemptFailure::Fatal(msg)) => return Err(SpeechError::Rejected(msg)),
                Err(AttemptFailure::Transient(cause)) => {
                    if !self.retry.allows_retry(attempts) {
                        return Err(SpeechError::Exhausted { attempts, cause });
                    }
                    let delay = self.retry.delay_for_retry(attempts - 1);
                    tracing::warn!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        cause = %cause,
                        "Transcription call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(
        &self,
        transcript: &str,
        request: SpeechRequest<'_>,
    ) -> Result<String, SpeechError> {
        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": request.prompt },
                    { "text": transcript }
                ]
            }]
        });

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.generate(request, &body).await {
                Ok(text) => return Ok(text.trim().to_string()),
                Err(AttemptFailure::Fatal(msg)) => return Err(SpeechError::Rejected(msg)),
                Err(AttemptFailure::Transient(cause)) => {
                    if !self.retry.allows_retry(attempts) {
                        return Err(SpeechError::Exhausted { attempts, cause });
                    }
                    let delay = self.retry.delay_for_retry(attempts - 1);
                    tracing::warn!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        cause = %cause,
                        "Summarization call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// One attempt's failure, before retry classification collapses it into the
/// port-level error.
#[derive(Debug)]
enum AttemptFailure {
    Transient(ApiFailure),
    Fatal(String),
}

fn classify_transport(e: reqwest::Error) -> AttemptFailure {
    if e.is_timeout() {
        AttemptFailure::Transient(ApiFailure::Timeout)
    } else {
        AttemptFailure::Transient(ApiFailure::Network(e.to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AttemptFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    let snippet: String = body.chars().take(200).collect();

    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(AttemptFailure::Transient(ApiFailure::RateLimited))
    } else if status.is_server_error() {
        Err(AttemptFailure::Transient(ApiFailure::Server(format!(
            "status {}: {}",
            status, snippet
        ))))
    } else {
        Err(AttemptFailure::Fatal(format!(
            "status {}: {}",
            status, snippet
        )))
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: RemoteFile,
}

#[derive(Debug, Deserialize)]
struct RemoteFile {
    name: String,
    uri: String,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}
