use std::path::Path;

use async_trait::async_trait;

/// Per-call parameters snapshotted from settings at the start of a job run.
/// Carrying them per request keeps a running job pinned to the settings it
/// started with.
#[derive(Debug, Clone, Copy)]
pub struct SpeechRequest<'a> {
    pub model: &'a str,
    pub api_key: &'a str,
    pub prompt: &'a str,
}

/// Transcribes one audio unit (the whole normalized artifact or one chunk).
/// Implementations apply the shared retry policy internally; callers only
/// ever see a post-retry outcome.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: &Path,
        request: SpeechRequest<'_>,
    ) -> Result<String, SpeechError>;
}

/// Produces the executive summary from an assembled transcript.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        transcript: &str,
        request: SpeechRequest<'_>,
    ) -> Result<String, SpeechError>;
}

/// Post-retry failure of an external generation call.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// Every allowed attempt failed transiently; carries the last cause.
    #[error("service failed after {attempts} attempts: {cause}")]
    Exhausted { attempts: u32, cause: ApiFailure },
    /// The service refused the request outright; retrying cannot help.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// A transient, retry-eligible failure mode of the external service.
#[derive(Debug, thiserror::Error)]
pub enum ApiFailure {
    #[error("rate limited")]
    RateLimited,
    #[error("request timed out")]
    Timeout,
    #[error("server error: {0}")]
    Server(String),
    #[error("network error: {0}")]
    Network(String),
}
