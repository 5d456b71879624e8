/// Byte span of the next whitespace-delimited word in `text[cursor..limit]`.
///
/// `cursor` and `limit` must sit on char boundaries.
pub(super) fn next_word_span(text: &str, cursor: usize, limit: usize) -> Option<(usize, usize)> {
    let window = text.get(cursor..limit)?;
    let mut start = None;

    for (offset, ch) in window.char_indices() {
        match (start, ch.is_whitespace()) {
            (None, false) => start = Some(offset),
            (Some(word_start), true) => return Some((cursor + word_start, cursor + offset)),
            _ => {}
        }
    }

    start.map(|word_start| (cursor + word_start, limit))
}

pub(super) fn skip_whitespace(text: &str, cursor: usize) -> usize {
    match text.get(cursor..) {
        Some(rest) => cursor + (rest.len() - rest.trim_start().len()),
        None => text.len(),
    }
}

pub(super) fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

pub(super) fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
