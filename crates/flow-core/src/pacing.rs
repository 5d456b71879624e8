//! Per-chunk display durations from speed, complexity and punctuation.

use serde::{Deserialize, Serialize};

use crate::{complexity::average_word_len, segment::Chunk};

pub const DEFAULT_BASE_SPEED: f64 = 320.0;

const MS_PER_MINUTE: f64 = 60_000.0;
const MIN_SPEED: f64 = 1.0;
const LEXICAL_WORD_LEN_MIN: f64 = 4.0;
const LEXICAL_WORD_LEN_MAX: f64 = 10.0;

/// Pacing knobs. Speeds are in chunks per minute, pauses in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacingConfig {
    pub base_speed: f64,
    /// Speed at which ratio-scaled terms apply unchanged.
    pub reference_speed: f64,
    pub complexity_scale: f64,
    /// `0.0..=1.0`; maps to a complexity exponent of `1 + 2 * sensitivity`.
    pub complexity_sensitivity: f64,
    /// How strongly the complexity delay shrinks as speed rises. `0.0` keeps
    /// it constant relative to the base term.
    pub complexity_attenuation: f64,
    pub complexity_floor_ms: f64,
    pub punctuation_scale: f64,
    pub sentence_pause_ms: f64,
    pub clause_pause_ms: f64,
    pub default_pause_ms: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base_speed: DEFAULT_BASE_SPEED,
            reference_speed: DEFAULT_BASE_SPEED,
            complexity_scale: 1.0,
            complexity_sensitivity: 0.85,
            complexity_attenuation: 0.0,
            complexity_floor_ms: 180.0,
            punctuation_scale: 0.6,
            sentence_pause_ms: 340.0,
            clause_pause_ms: 180.0,
            default_pause_ms: 80.0,
        }
    }
}

impl PacingConfig {
    pub fn with_overrides(self, overrides: &PacingOverrides) -> Self {
        overrides.apply(self)
    }

    fn exponent(&self) -> f64 {
        1.0 + unit(self.complexity_sensitivity) * 2.0
    }

    fn pause_for(&self, class: PunctuationClass) -> f64 {
        let pause = match class {
            PunctuationClass::Sentence => self.sentence_pause_ms,
            PunctuationClass::Clause => self.clause_pause_ms,
            PunctuationClass::Dash => self.default_pause_ms,
            PunctuationClass::None => 0.0,
        };
        non_negative(pause)
    }
}

/// Partial pacing settings merged over [`PacingConfig::default`] or any other
/// base config.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity_sensitivity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity_attenuation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity_floor_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub punctuation_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence_pause_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clause_pause_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_pause_ms: Option<f64>,
}

impl PacingOverrides {
    pub fn apply(&self, base: PacingConfig) -> PacingConfig {
        PacingConfig {
            base_speed: self.base_speed.unwrap_or(base.base_speed),
            reference_speed: self.reference_speed.unwrap_or(base.reference_speed),
            complexity_scale: self.complexity_scale.unwrap_or(base.complexity_scale),
            complexity_sensitivity: self
                .complexity_sensitivity
                .unwrap_or(base.complexity_sensitivity),
            complexity_attenuation: self
                .complexity_attenuation
                .unwrap_or(base.complexity_attenuation),
            complexity_floor_ms: self.complexity_floor_ms.unwrap_or(base.complexity_floor_ms),
            punctuation_scale: self.punctuation_scale.unwrap_or(base.punctuation_scale),
            sentence_pause_ms: self.sentence_pause_ms.unwrap_or(base.sentence_pause_ms),
            clause_pause_ms: self.clause_pause_ms.unwrap_or(base.clause_pause_ms),
            default_pause_ms: self.default_pause_ms.unwrap_or(base.default_pause_ms),
        }
    }
}

/// Pause class of a chunk's trailing character.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PunctuationClass {
    Sentence,
    Clause,
    Dash,
    None,
}

impl PunctuationClass {
    pub fn of(text: &str) -> Self {
        match text.trim_end().chars().next_back() {
            Some('.' | '!' | '?') => Self::Sentence,
            Some(',' | ';' | ':') => Self::Clause,
            Some('-') => Self::Dash,
            _ => Self::None,
        }
    }
}

/// Components of one chunk's on-screen time, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkPacing {
    pub base_ms: f64,
    pub complexity_ms: f64,
    pub floor_ms: f64,
    pub punctuation_ms: f64,
}

impl ChunkPacing {
    pub fn total_ms(&self) -> f64 {
        self.base_ms + self.complexity_ms + self.floor_ms + self.punctuation_ms
    }

    /// Total rounded for display; never below 1 ms.
    pub fn display_ms(&self) -> u32 {
        self.total_ms().round().clamp(1.0, u32::MAX as f64) as u32
    }
}

/// Complexity from average word length alone, mapped from 4..=10 chars.
pub fn lexical_complexity(text: &str) -> f64 {
    let avg = average_word_len(text) as f64;
    unit((avg - LEXICAL_WORD_LEN_MIN) / (LEXICAL_WORD_LEN_MAX - LEXICAL_WORD_LEN_MIN))
}

/// The larger of the chunk's own score and its lexical complexity.
pub fn effective_complexity(chunk: &Chunk) -> f64 {
    unit(chunk.complexity as f64).max(lexical_complexity(&chunk.text))
}

/// Breaks down the display time of `chunk` at `base_speed`.
///
/// Non-finite speeds fall back to [`DEFAULT_BASE_SPEED`]; speeds below one
/// chunk per minute are raised to one.
pub fn pace_chunk(chunk: &Chunk, base_speed: f64, config: &PacingConfig) -> ChunkPacing {
    let speed = sanitize_speed(base_speed);
    let speed_ratio = sanitize_speed(config.reference_speed) / speed;
    let base_ms = MS_PER_MINUTE / speed;

    let effective = effective_complexity(chunk);
    let raw_complexity_ms =
        effective.powf(config.exponent()) * base_ms * non_negative(config.complexity_scale);
    let attenuation = speed_ratio.powf(non_negative(config.complexity_attenuation));
    let floor_ms = non_negative(config.complexity_floor_ms) * effective;

    let punctuation = config.pause_for(PunctuationClass::of(&chunk.text));
    let punctuation_ms = punctuation * speed_ratio.powf(non_negative(config.punctuation_scale));

    ChunkPacing {
        base_ms,
        complexity_ms: raw_complexity_ms * attenuation,
        floor_ms,
        punctuation_ms,
    }
}

/// Milliseconds `chunk` stays on screen at `base_speed`.
pub fn chunk_duration_ms(chunk: &Chunk, base_speed: f64, config: &PacingConfig) -> f64 {
    pace_chunk(chunk, base_speed, config).total_ms()
}

fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() {
        speed.max(MIN_SPEED)
    } else {
        DEFAULT_BASE_SPEED
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
