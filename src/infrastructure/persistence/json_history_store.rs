use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::{HistoryStore, HistoryStoreError};
use crate::domain::{Job, JobId};

/// File-backed job history: one JSON object keyed by job id. Writes go
/// through a sibling temp file and a rename so a crash mid-write cannot
/// truncate the history. A corrupt or missing file reads as empty history
/// rather than an error.
pub struct JsonHistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(path: PathBuf) -> Result<Self, HistoryStoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    async fn read_map(&self) -> HashMap<String, Job> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to read job history; starting empty");
                return HashMap::new();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(map) => map,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Corrupt job history; starting empty");
                HashMap::new()
            }
        }
    }

    async fn write_map(&self, map: &HashMap<String, Job>) -> Result<(), HistoryStoreError> {
        let raw = serde_json::to_vec_pretty(map)
            .map_err(|e| HistoryStoreError::Corrupt(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, raw).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn save(&self, job: &Job) -> Result<(), HistoryStoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await;
        map.insert(job.id.to_string(), job.clone());
        self.write_map(&map).await?;
        tracing::debug!(job_id = %job.id, "Persisted job");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Job>, HistoryStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await.into_values().collect())
    }

    async fn load_by_id(&self, id: JobId) -> Result<Option<Job>, HistoryStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await.remove(&id.to_string()))
    }

    async fn delete(&self, id: JobId) -> Result<(), HistoryStoreError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await;
        if map.remove(&id.to_string()).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}
