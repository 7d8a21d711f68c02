use async_trait::async_trait;

use crate::domain::{Job, JobId};

/// Durable record of jobs. Written at creation and at every terminal
/// transition; never authoritative while a job is active (the in-memory
/// registry is what polling reads).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save(&self, job: &Job) -> Result<(), HistoryStoreError>;

    async fn load_all(&self) -> Result<Vec<Job>, HistoryStoreError>;

    async fn load_by_id(&self, id: JobId) -> Result<Option<Job>, HistoryStoreError>;

    async fn delete(&self, id: JobId) -> Result<(), HistoryStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt history data: {0}")]
    Corrupt(String),
}
