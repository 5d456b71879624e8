use log::debug;

use super::{Chunk, Fragment, MergeMode, ReconcileOptions, ThrottlePolicy, filler_chunks};
use crate::complexity;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum GapKind {
    Interior,
    Trailing,
}

impl ThrottlePolicy {
    fn admits(&self, gap: GapKind, covered: f32, fill_len: usize) -> bool {
        let (min_coverage, max_chunks) = match gap {
            GapKind::Interior => (self.interior_min_coverage, self.interior_max_chunks),
            GapKind::Trailing => (self.trailing_min_coverage, self.trailing_max_chunks),
        };
        covered > min_coverage && fill_len <= max_chunks
    }
}

/// Merges model fragments with filler so the result partitions `source`.
///
/// Fragments are located in order, each at or after the end of the previous
/// match; a fragment that cannot be found verbatim is dropped and the span it
/// claimed is filled instead. In [`MergeMode::Final`] the result covers every
/// word of `source`. In [`MergeMode::Streaming`] gap filling is held back by
/// `options.throttle`. An empty fragment list always yields no chunks.
pub fn merge(
    source: &str,
    fragments: &[Fragment],
    mode: MergeMode,
    options: &ReconcileOptions,
) -> Vec<Chunk> {
    if fragments.is_empty() || source.is_empty() {
        return Vec::new();
    }

    let total = source.len();
    let mut chunks = Vec::with_capacity(fragments.len());
    let mut ptr = 0usize;
    let mut dropped = 0usize;

    for fragment in fragments {
        let needle = fragment.text.trim();
        if needle.is_empty() {
            continue;
        }

        let Some(relative) = source[ptr..].find(needle) else {
            dropped += 1;
            debug!(
                "segment: fragment not found after byte {}: {:?}",
                ptr,
                preview(needle)
            );
            continue;
        };
        let idx = ptr + relative;

        if idx > ptr {
            append_fill(source, ptr, idx, GapKind::Interior, mode, options, &mut chunks);
        }

        let end = idx + needle.len();
        let score = complexity::normalize(&fragment.complexity);
        chunks.push(Chunk::from_source(source, idx, end, score));
        ptr = end;
    }

    if ptr < total {
        append_fill(source, ptr, total, GapKind::Trailing, mode, options, &mut chunks);
    }

    if dropped > 0 {
        debug!(
            "segment: merged {} fragments into {} chunks, {} dropped",
            fragments.len(),
            chunks.len(),
            dropped
        );
    }

    chunks
}

/// [`merge`] for a fragment list known to be complete, with default options.
pub fn merge_final(source: &str, fragments: &[Fragment]) -> Vec<Chunk> {
    merge(source, fragments, MergeMode::Final, &ReconcileOptions::default())
}

/// [`merge`] for a fragment list that may still grow, with default options.
pub fn merge_streaming(source: &str, fragments: &[Fragment]) -> Vec<Chunk> {
    merge(source, fragments, MergeMode::Streaming, &ReconcileOptions::default())
}

fn append_fill(
    source: &str,
    start: usize,
    end: usize,
    gap: GapKind,
    mode: MergeMode,
    options: &ReconcileOptions,
    chunks: &mut Vec<Chunk>,
) {
    let fill = filler_chunks(source, start, end, options.words_per_chunk);
    if fill.is_empty() {
        return;
    }

    if mode == MergeMode::Streaming {
        let covered = start as f32 / source.len() as f32;
        if !options.throttle.admits(gap, covered, fill.len()) {
            debug!(
                "segment: held back {} filler chunks for {:?} gap {}..{} at {:.0}% coverage",
                fill.len(),
                gap,
                start,
                end,
                covered * 100.0
            );
            return;
        }
    }

    chunks.extend(fill);
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(32) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
