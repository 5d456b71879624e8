use heapless::String as HeaplessString;

use super::text_utils::{floor_char_boundary, skip_whitespace};
use crate::text_policy::{SECTION_LABEL_BYTES, section_label};

/// Upper bound, in bytes, of a section sent to the model in one request.
pub const DEFAULT_SECTION_BYTES: usize = 2_000;

/// Bounded, trimmed span of a document, tagged with its byte offsets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Section {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Section {
    pub fn label(&self) -> HeaplessString<SECTION_LABEL_BYTES> {
        section_label(&self.text)
    }
}

/// Splits `document` into ordered sections of at most `max_bytes` bytes.
///
/// Cuts prefer a paragraph break, then a sentence end, then any whitespace.
/// A single word longer than `max_bytes` becomes a section of its own.
pub fn split_sections(document: &str, max_bytes: usize) -> Vec<Section> {
    let max_bytes = max_bytes.max(1);
    let mut sections = Vec::new();
    let mut cursor = skip_whitespace(document, 0);

    while cursor < document.len() {
        let remaining = &document[cursor..];
        let cut = if remaining.len() <= max_bytes {
            remaining.len()
        } else {
            pick_cut(remaining, max_bytes)
        };

        let text = remaining[..cut].trim_end();
        sections.push(Section {
            index: sections.len(),
            start: cursor,
            end: cursor + text.len(),
            text: text.to_owned(),
        });

        cursor = skip_whitespace(document, cursor + cut);
    }

    sections
}

/// Cut offset inside `remaining`, which starts with a non-whitespace char.
fn pick_cut(remaining: &str, max_bytes: usize) -> usize {
    let window = &remaining[..floor_char_boundary(remaining, max_bytes)];

    if let Some(pos) = window.rfind("\n\n").filter(|pos| *pos > 0) {
        return pos;
    }

    if let Some(pos) = last_sentence_end(remaining, window.len()) {
        return pos;
    }

    if let Some(pos) = window.rfind(char::is_whitespace).filter(|pos| *pos > 0) {
        return pos;
    }

    remaining
        .find(char::is_whitespace)
        .unwrap_or(remaining.len())
}

fn last_sentence_end(remaining: &str, window_len: usize) -> Option<usize> {
    let mut found = None;
    let mut chars = remaining.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let end = idx + ch.len_utf8();
        if end > window_len {
            break;
        }
        if matches!(ch, '.' | '!' | '?')
            && chars
                .peek()
                .is_some_and(|(_, next)| next.is_whitespace())
        {
            found = Some(end);
        }
    }

    found
}
