use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::{JobPipeline, SubmitRequest};

/// A small fixed pool of workers draining the submission queue. Jobs run
/// fully in parallel across slots; within one slot the pipeline is strictly
/// sequential.
pub struct WorkerPool;

impl WorkerPool {
    pub fn spawn(
        workers: usize,
        receiver: mpsc::Receiver<SubmitRequest>,
        pipeline: Arc<JobPipeline>,
    ) -> Vec<JoinHandle<()>> {
        let receiver = Arc::new(Mutex::new(receiver));

        (0..workers)
            .map(|slot| {
                let receiver = Arc::clone(&receiver);
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    tracing::info!(slot, "Worker started");
                    loop {
                        let request = {
                            let mut rx = receiver.lock().await;
                            rx.recv().await
                        };
                        match request {
                            Some(request) => pipeline.run(request).await,
                            None => break,
                        }
                    }
                    tracing::info!(slot, "Worker stopped: queue closed");
                })
            })
            .collect()
    }
}
