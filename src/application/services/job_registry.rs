use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::application::ports::HistoryStore;
use crate::domain::{Job, JobId, JobStatus};

/// Default bound on queued-but-not-yet-claimed submissions. Beyond it,
/// submission fails fast instead of accepting unbounded backlog.
pub const SUBMIT_QUEUE_CAPACITY: usize = 32;

/// Handed to a worker when it claims a job.
#[derive(Debug)]
pub struct SubmitRequest {
    pub job_id: JobId,
    pub source_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
#[error("processing queue is full")]
pub struct CapacityError;

/// Process-wide job map plus the submission queue feeding the worker pool.
///
/// The map is the authoritative view of every job while the process runs:
/// workers replace whole records, pollers clone snapshots, so readers never
/// observe a half-written job. The history store trails behind it (creation
/// and terminal transitions only) and its failures are logged, never
/// surfaced to polling.
pub struct JobRegistry {
    jobs: DashMap<JobId, Job>,
    sender: mpsc::Sender<SubmitRequest>,
    store: Arc<dyn HistoryStore>,
}

impl JobRegistry {
    pub fn new(store: Arc<dyn HistoryStore>) -> (Arc<Self>, mpsc::Receiver<SubmitRequest>) {
        Self::with_capacity(store, SUBMIT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        store: Arc<dyn HistoryStore>,
        queue_capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<SubmitRequest>) {
        let (sender, receiver) = mpsc::channel(queue_capacity);
        let registry = Arc::new(Self {
            jobs: DashMap::new(),
            sender,
            store,
        });
        (registry, receiver)
    }

    /// Load persisted history into the registry. Jobs the previous process
    /// left non-terminal can never finish now, so they are failed on the spot
    /// and re-saved.
    pub async fn hydrate(&self) -> usize {
        let jobs = match self.store.load_all().await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load job history");
                return 0;
            }
        };

        let mut count = 0;
        for mut job in jobs {
            if !job.is_terminal() {
                tracing::warn!(job_id = %job.id, "Marking job interrupted by restart as failed");
                job.status = JobStatus::Failed;
                job.error = Some("Processing was interrupted by a service restart.".to_string());
                job.completed_at = Some(Utc::now());
                self.persist(&job).await;
            }
            self.jobs.insert(job.id, job);
            count += 1;
        }

        tracing::info!(jobs = count, "Job history loaded");
        count
    }

    /// Accept a new upload for processing. Queue capacity is reserved before
    /// the job record exists, so a full queue rejects the submission without
    /// leaving anything behind.
    pub async fn submit(
        &self,
        filename: String,
        source_path: PathBuf,
    ) -> Result<JobId, CapacityError> {
        let permit = self.sender.try_reserve().map_err(|_| CapacityError)?;

        let job = Job::new(filename);
        let job_id = job.id;

        self.persist(&job).await;
        self.jobs.insert(job_id, job);

        permit.send(SubmitRequest {
            job_id,
            source_path,
        });

        tracing::info!(job_id = %job_id, "Job submitted");
        Ok(job_id)
    }

    /// O(1) snapshot read for the polling surface.
    pub fn snapshot(&self, id: JobId) -> Option<Job> {
        self.jobs.get(&id).map(|j| j.clone())
    }

    /// All known jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.iter().map(|e| e.value().clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Pending -> Processing, exactly once, when a worker claims the job.
    pub fn begin_processing(&self, id: JobId) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            if job.status == JobStatus::Pending {
                job.status = JobStatus::Processing;
                job.status_message = Some("Processing started".to_string());
            }
        }
    }

    /// Progress is observational and monotonic: updates apply only while
    /// Processing and never move the percentage backwards.
    pub fn update_progress(&self, id: JobId, progress: u8, message: impl Into<String>) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            if job.status == JobStatus::Processing {
                job.progress = job.progress.max(progress.min(100));
                job.status_message = Some(message.into());
            }
        }
    }

    pub async fn complete(&self, id: JobId, transcript: String, summary: String) {
        let saved = {
            let mut entry = match self.jobs.get_mut(&id) {
                Some(entry) => entry,
                None => {
                    tracing::debug!(job_id = %id, "Job removed before completion");
                    return;
                }
            };
            if entry.is_terminal() {
                return;
            }
            entry.status = JobStatus::Completed;
            entry.progress = 100;
            entry.status_message = Some("Done".to_string());
            entry.transcript = Some(transcript);
            entry.summary = Some(summary);
            entry.completed_at = Some(Utc::now());
            entry.clone()
        };

        self.persist(&saved).await;
        tracing::info!(job_id = %id, "Job completed");
    }

    /// Terminal failure: progress stays frozen at its last value, only the
    /// user-safe error message is recorded.
    pub async fn fail(&self, id: JobId, error: impl Into<String>) {
        let error = error.into();
        let saved = {
            let mut entry = match self.jobs.get_mut(&id) {
                Some(entry) => entry,
                None => {
                    tracing::debug!(job_id = %id, "Job removed before failure could be recorded");
                    return;
                }
            };
            if entry.is_terminal() {
                return;
            }
            entry.status = JobStatus::Failed;
            entry.status_message = None;
            entry.error = Some(error.clone());
            entry.completed_at = Some(Utc::now());
            entry.clone()
        };

        self.persist(&saved).await;
        tracing::warn!(job_id = %id, error = %error, "Job failed");
    }

    /// Remove a job from the registry and the history store. This hides the
    /// job from history only: a worker already running it is not interrupted
    /// and will finish against a record that no longer exists.
    pub async fn delete(&self, id: JobId) -> bool {
        let removed = self.jobs.remove(&id).is_some();
        if removed {
            if let Err(e) = self.store.delete(id).await {
                tracing::error!(job_id = %id, error = %e, "Failed to delete job from history");
            }
        }
        removed
    }

    async fn persist(&self, job: &Job) {
        if let Err(e) = self.store.save(job).await {
            tracing::error!(job_id = %job.id, error = %e, "Failed to persist job; in-memory state remains authoritative");
        }
    }
}
