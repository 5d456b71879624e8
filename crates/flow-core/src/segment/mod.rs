//! Reconciliation of model fragments into display-ready chunks.

use core::{fmt, ops::Range};

use serde::{
    Deserialize, Deserializer,
    de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor},
};

use crate::complexity;

mod filler;
mod merge;
mod sections;
mod text_utils;

pub use filler::filler_chunks;
pub use merge::{merge, merge_final, merge_streaming};
pub use sections::{DEFAULT_SECTION_BYTES, Section, split_sections};

/// Words grouped into one filler chunk unless the caller asks otherwise.
pub const DEFAULT_WORDS_PER_CHUNK: usize = 3;

/// Complexity exactly as the model sent it.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RawComplexity {
    Number(f64),
    Text(String),
    /// Absent, `null`, or a value of a type that cannot carry a score.
    #[default]
    Missing,
}

impl From<f64> for RawComplexity {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawComplexity {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl<'de> Deserialize<'de> for RawComplexity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RawComplexityVisitor)
    }
}

struct RawComplexityVisitor;

impl<'de> Visitor<'de> for RawComplexityVisitor {
    type Value = RawComplexity;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a complexity score")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(RawComplexity::Number(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(RawComplexity::Number(value as f64))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(RawComplexity::Number(value as f64))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(RawComplexity::Text(value.to_owned()))
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Self::Value, E> {
        Ok(RawComplexity::Missing)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(RawComplexity::Missing)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(RawComplexity::Missing)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(RawComplexity::Missing)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(RawComplexity::Missing)
    }
}

/// One untrusted item of the model's segmentation output.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Fragment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub complexity: RawComplexity,
}

impl Fragment {
    pub fn new(text: impl Into<String>, complexity: impl Into<RawComplexity>) -> Self {
        Self {
            text: text.into(),
            complexity: complexity.into(),
        }
    }

    pub fn unscored(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            complexity: RawComplexity::Missing,
        }
    }
}

/// Display-ready unit. `text` equals `source[start..end]` of the span it was
/// reconciled against.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Always within `0.0..=1.0`.
    pub complexity: f32,
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub(crate) fn from_source(source: &str, start: usize, end: usize, complexity: f32) -> Self {
        Self {
            text: source[start..end].to_owned(),
            complexity: complexity::clamp_unit(complexity),
            start,
            end,
        }
    }

    /// Chunk for `source[start..end]` scored by the lexical estimator.
    pub(crate) fn estimated(source: &str, start: usize, end: usize) -> Self {
        let complexity = complexity::estimate(&source[start..end]);
        Self::from_source(source, start, end, complexity)
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Whether the fragment list may still grow.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeMode {
    Streaming,
    Final,
}

impl MergeMode {
    pub const fn from_complete(complete: bool) -> Self {
        if complete { Self::Final } else { Self::Streaming }
    }
}

/// Limits on gap filling while the fragment list is still partial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThrottlePolicy {
    /// Covered fraction of the source that must be exceeded before an
    /// interior gap is filled.
    pub interior_min_coverage: f32,
    /// Covered fraction that must be exceeded before the trailing gap is
    /// filled.
    pub trailing_min_coverage: f32,
    pub interior_max_chunks: usize,
    pub trailing_max_chunks: usize,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            interior_min_coverage: 0.5,
            trailing_min_coverage: 0.8,
            interior_max_chunks: 20,
            trailing_max_chunks: 30,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconcileOptions {
    pub words_per_chunk: usize,
    pub throttle: ThrottlePolicy,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            words_per_chunk: DEFAULT_WORDS_PER_CHUNK,
            throttle: ThrottlePolicy::default(),
        }
    }
}

impl ReconcileOptions {
    pub fn with_words_per_chunk(mut self, words_per_chunk: usize) -> Self {
        self.words_per_chunk = words_per_chunk;
        self
    }
}

/// Byte ranges of `source` holding non-whitespace text that no chunk covers.
///
/// Empty for a final reconciliation; while streaming it reports what the
/// throttle held back.
pub fn uncovered_ranges(source: &str, chunks: &[Chunk]) -> Vec<Range<usize>> {
    let mut gaps = Vec::new();
    let mut cursor = 0usize;

    for chunk in chunks {
        if chunk.start > cursor {
            push_gap(source, cursor, chunk.start, &mut gaps);
        }
        cursor = cursor.max(chunk.end);
    }
    push_gap(source, cursor, source.len(), &mut gaps);

    gaps
}

fn push_gap(source: &str, start: usize, end: usize, gaps: &mut Vec<Range<usize>>) {
    let Some(slice) = source.get(start..end) else {
        return;
    };
    let trimmed_start = slice.trim_start();
    if trimmed_start.is_empty() {
        return;
    }
    let lead = slice.len() - trimmed_start.len();
    let body = trimmed_start.trim_end();
    gaps.push(start + lead..start + lead + body.len());
}

#[cfg(test)]
mod tests;
