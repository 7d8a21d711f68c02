mod job_registry;
mod pipeline;
mod transcript_assembler;
mod worker_pool;

pub use job_registry::{CapacityError, JobRegistry, SubmitRequest, SUBMIT_QUEUE_CAPACITY};
pub use pipeline::{JobPipeline, PipelineConfig, PipelineError};
pub use transcript_assembler::{assemble_transcript, AssemblyError, ChunkTranscript};
pub use worker_pool::WorkerPool;
