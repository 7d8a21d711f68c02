/// One bounded time-range slice of a normalized audio artifact. `index` is
/// the sole ordering key used when reassembling per-chunk transcripts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkSpan {
    pub index: usize,
    pub start_secs: f64,
    pub duration_secs: f64,
}

/// An ordered partition of `[0, total_duration)` into consecutive windows,
/// none longer than the configured maximum.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPlan {
    spans: Vec<ChunkSpan>,
}

impl ChunkPlan {
    pub fn spans(&self) -> &[ChunkSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// A single-chunk plan degenerates to the non-chunked transcription path.
    pub fn is_single(&self) -> bool {
        self.spans.len() == 1
    }
}

/// Partition a total duration into transcription windows.
///
/// Returns one chunk covering the whole duration when it fits under
/// `max_chunk_secs`; otherwise consecutive windows of `max_chunk_secs` with
/// the final window truncated to the remainder. Never pads past the end,
/// never drops the remainder.
pub fn plan_chunks(duration_secs: f64, max_chunk_secs: f64) -> ChunkPlan {
    debug_assert!(max_chunk_secs > 0.0, "chunk window must be positive");

    if duration_secs <= max_chunk_secs {
        return ChunkPlan {
            spans: vec![ChunkSpan {
                index: 0,
                start_secs: 0.0,
                duration_secs,
            }],
        };
    }

    let count = (duration_secs / max_chunk_secs).ceil() as usize;
    let spans = (0..count)
        .map(|index| {
            let start_secs = index as f64 * max_chunk_secs;
            ChunkSpan {
                index,
                start_secs,
                duration_secs: (duration_secs - start_secs).min(max_chunk_secs),
            }
        })
        .collect();

    ChunkPlan { spans }
}
