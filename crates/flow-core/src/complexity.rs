//! Lexical complexity scoring for text fragments.

use crate::segment::RawComplexity;

const PUNCTUATION_CHARS: &[char] = &['.', ',', ';', ':', '!', '?', '(', ')', '\'', '"', '-'];

const WORD_LEN_BASELINE: f32 = 3.0;
const WORD_LEN_SPAN: f32 = 6.0;
const PUNCT_REFERENCE_DENSITY: f32 = 0.15;
const DIGIT_REFERENCE_DENSITY: f32 = 0.20;
const UPPER_REFERENCE_DENSITY: f32 = 0.20;

const WORD_LEN_WEIGHT: f32 = 0.5;
const PUNCT_WEIGHT: f32 = 0.2;
const DIGIT_WEIGHT: f32 = 0.2;
const UPPER_WEIGHT: f32 = 0.1;

/// Heuristic complexity in `0.0..=1.0` from surface features of `text`.
///
/// Longer words and denser punctuation, digits or capitals score higher.
/// Empty or whitespace-only input scores `0.0`.
pub fn estimate(text: &str) -> f32 {
    let avg_word_len = average_word_len(text);
    let word_factor = clamp_unit((avg_word_len - WORD_LEN_BASELINE) / WORD_LEN_SPAN);

    let mut chars = 0usize;
    let mut punct = 0usize;
    let mut digits = 0usize;
    let mut upper = 0usize;
    for ch in text.chars() {
        chars += 1;
        if PUNCTUATION_CHARS.contains(&ch) {
            punct += 1;
        } else if ch.is_numeric() {
            digits += 1;
        } else if ch.is_uppercase() {
            upper += 1;
        }
    }

    let (punct_factor, digit_factor, upper_factor) = if chars == 0 {
        (0.0, 0.0, 0.0)
    } else {
        let total = chars as f32;
        (
            clamp_unit(punct as f32 / total / PUNCT_REFERENCE_DENSITY),
            clamp_unit(digits as f32 / total / DIGIT_REFERENCE_DENSITY),
            clamp_unit(upper as f32 / total / UPPER_REFERENCE_DENSITY),
        )
    };

    clamp_unit(
        WORD_LEN_WEIGHT * word_factor
            + PUNCT_WEIGHT * punct_factor
            + DIGIT_WEIGHT * digit_factor
            + UPPER_WEIGHT * upper_factor,
    )
}

/// Complexity used when a fragment carries no usable score.
pub fn fallback() -> f32 {
    estimate("")
}

/// Normalizes a model-provided complexity into `0.0..=1.0`.
///
/// Finite numbers and numeric strings are clamped; everything else falls back
/// to [`fallback`].
pub fn normalize(raw: &RawComplexity) -> f32 {
    let value = match raw {
        RawComplexity::Number(value) => Some(*value),
        RawComplexity::Text(text) => text.trim().parse::<f64>().ok(),
        RawComplexity::Missing => None,
    };

    match value {
        Some(value) if value.is_finite() => value.clamp(0.0, 1.0) as f32,
        _ => fallback(),
    }
}

/// Mean length in chars of the whitespace-separated words of `text`.
pub fn average_word_len(text: &str) -> f32 {
    let mut words = 0usize;
    let mut chars = 0usize;
    for word in text.split_whitespace() {
        words += 1;
        chars += word.chars().count();
    }

    if words == 0 {
        0.0
    } else {
        chars as f32 / words as f32
    }
}

pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
