use super::{
    Chunk,
    text_utils::{ceil_char_boundary, floor_char_boundary, next_word_span},
};

/// Splits `source[start..end]` into runs of up to `words_per_chunk` words.
///
/// Each chunk is the verbatim source slice from its first word to its last,
/// scored with the lexical estimator. Out-of-range bounds are clamped and a
/// zero word count is treated as one.
pub fn filler_chunks(source: &str, start: usize, end: usize, words_per_chunk: usize) -> Vec<Chunk> {
    let end = floor_char_boundary(source, end);
    let mut cursor = ceil_char_boundary(source, start);
    let per_chunk = words_per_chunk.max(1);
    let mut chunks = Vec::new();

    if cursor >= end {
        return chunks;
    }

    while let Some((run_start, first_end)) = next_word_span(source, cursor, end) {
        let mut run_end = first_end;
        let mut words = 1usize;
        cursor = first_end;

        while words < per_chunk {
            let Some((_, word_end)) = next_word_span(source, cursor, end) else {
                break;
            };
            run_end = word_end;
            cursor = word_end;
            words += 1;
        }

        chunks.push(Chunk::estimated(source, run_start, run_end));
    }

    chunks
}
