use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobId, JobStatus};

/// A single summarization job and everything a polling client can observe
/// about it. The in-memory registry owns the live record; the history store
/// receives a copy at creation and at the terminal transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub filename: String,
    pub status: JobStatus,
    /// 0-100, monotonically non-decreasing while `Processing`.
    pub progress: u8,
    pub status_message: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(filename: String) -> Self {
        Self {
            id: JobId::new(),
            filename,
            status: JobStatus::Pending,
            progress: 0,
            status_message: Some("Waiting for a worker".to_string()),
            transcript: None,
            summary: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
