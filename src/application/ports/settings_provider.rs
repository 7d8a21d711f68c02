use async_trait::async_trait;

/// Settings as seen by one job run. Snapshotted once when a worker picks the
/// job up; mid-run changes only affect later jobs.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    pub model: String,
    pub transcription_prompt: String,
    pub summary_prompt: String,
    /// Same numeric type as the probed media duration, so the chunking
    /// threshold comparison can never mix types.
    pub max_chunk_secs: f64,
    pub api_key: String,
}

#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn snapshot(&self) -> Result<SettingsSnapshot, SettingsError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt settings data: {0}")]
    Corrupt(String),
}
