//! Fixed-capacity labels for sections and chunk timelines.

use core::fmt::Write;

use heapless::String;

pub const SECTION_LABEL_WORDS: usize = 6;
pub const SECTION_LABEL_CHARS: usize = 34;
pub const SECTION_LABEL_BYTES: usize = 48;
pub const PROGRESS_LABEL_BYTES: usize = 24;

/// First words of a section, truncated with `...` when longer.
pub fn section_label(text: &str) -> String<SECTION_LABEL_BYTES> {
    preview_limited(text, SECTION_LABEL_WORDS, SECTION_LABEL_CHARS)
}

/// Whitespace-normalized preview of `source` bounded by words, chars and `N`
/// bytes.
pub fn preview_limited<const N: usize>(
    source: &str,
    max_words: usize,
    max_chars: usize,
) -> String<N> {
    let mut out = String::<N>::new();
    let mut char_count = 0usize;
    let mut truncated = false;

    for (word_count, word) in source.split_whitespace().enumerate() {
        if word_count >= max_words {
            truncated = true;
            break;
        }

        if word_count > 0 {
            if char_count >= max_chars || out.push(' ').is_err() {
                truncated = true;
                break;
            }
            char_count += 1;
        }

        for ch in word.chars() {
            if char_count >= max_chars || out.push(ch).is_err() {
                truncated = true;
                break;
            }
            char_count += 1;
        }

        if truncated {
            break;
        }
    }

    if truncated && !out.is_empty() {
        while out.len() + 3 > N {
            if out.pop().is_none() {
                break;
            }
        }
        let _ = out.push_str("...");
    }

    out
}

/// `index/total` followed by an optional suffix, e.g. `3/12 sec`.
pub fn progress_label(index: usize, total: usize, suffix: &str) -> String<PROGRESS_LABEL_BYTES> {
    let mut out = String::new();
    let _ = write!(out, "{index}/{total}");
    if !suffix.is_empty() {
        let _ = out.push(' ');
        for ch in suffix.chars() {
            if out.push(ch).is_err() {
                break;
            }
        }
    }
    out
}
