use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{ChunkSpan, NormalizedMedia};

/// Wraps the external transcoding tool. `normalize` produces the canonical
/// audio profile and reports duration; `slice` cuts one chunk out of an
/// already-normalized artifact. All outputs land in the caller's scratch
/// directory, which owns their deletion.
#[async_trait]
pub trait MediaConverter: Send + Sync {
    async fn normalize(
        &self,
        source: &Path,
        scratch_dir: &Path,
    ) -> Result<NormalizedMedia, MediaError>;

    async fn slice(
        &self,
        media: &NormalizedMedia,
        span: ChunkSpan,
        scratch_dir: &Path,
    ) -> Result<PathBuf, MediaError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),
    #[error("transcoder failed: {0}")]
    ToolExecution(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
