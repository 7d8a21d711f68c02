use recapd::application::services::{assemble_transcript, AssemblyError, ChunkTranscript};

fn part(index: usize, text: &str) -> ChunkTranscript {
    ChunkTranscript {
        index,
        text: text.to_string(),
    }
}

#[test]
fn given_parts_out_of_order_when_assembling_then_output_follows_index_order() {
    let parts = vec![part(2, "third"), part(0, "first"), part(1, "second")];

    let transcript = assemble_transcript(parts).unwrap();

    assert_eq!(transcript, "first\n\nsecond\n\nthird");
}

#[test]
fn given_single_part_when_assembling_then_text_returned_unchanged() {
    let transcript = assemble_transcript(vec![part(0, "only part")]).unwrap();

    assert_eq!(transcript, "only part");
}

#[test]
fn given_missing_index_when_assembling_then_reports_first_gap() {
    let parts = vec![part(0, "first"), part(2, "third")];

    let err = assemble_transcript(parts).unwrap_err();

    assert_eq!(err, AssemblyError::MissingChunk { index: 1 });
}

#[test]
fn given_missing_first_chunk_when_assembling_then_reports_index_zero() {
    let err = assemble_transcript(vec![part(1, "second")]).unwrap_err();

    assert_eq!(err, AssemblyError::MissingChunk { index: 0 });
}

#[test]
fn given_whitespace_padded_parts_when_assembling_then_boundaries_are_single_blank_lines() {
    let parts = vec![part(0, "first\n"), part(1, "\nsecond")];

    let transcript = assemble_transcript(parts).unwrap();

    assert_eq!(transcript, "first\n\nsecond");
}
