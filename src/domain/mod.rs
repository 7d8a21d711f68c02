mod chunk_plan;
mod job;
mod job_id;
mod job_status;
mod normalized_media;
mod retry_policy;

pub use chunk_plan::{plan_chunks, ChunkPlan, ChunkSpan};
pub use job::Job;
pub use job_id::JobId;
pub use job_status::JobStatus;
pub use normalized_media::NormalizedMedia;
pub use retry_policy::RetryPolicy;
