/// One chunk's transcript, keyed by the chunk's position in the plan.
#[derive(Debug, Clone)]
pub struct ChunkTranscript {
    pub index: usize,
    pub text: String,
}

/// Concatenate per-chunk transcripts in ascending index order, separated by a
/// blank line so downstream summarization sees paragraph breaks.
///
/// Validates that every index `0..n` is present. A correct orchestrator never
/// produces a gap, but the assembler checks anyway rather than silently
/// emitting a transcript with missing minutes.
pub fn assemble_transcript(
    mut parts: Vec<ChunkTranscript>,
) -> Result<String, AssemblyError> {
    parts.sort_by_key(|p| p.index);

    for (expected, part) in parts.iter().enumerate() {
        if part.index != expected {
            return Err(AssemblyError::MissingChunk { index: expected });
        }
    }

    Ok(parts
        .iter()
        .map(|p| p.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("transcript for chunk {index} is missing")]
    MissingChunk { index: usize },
}
