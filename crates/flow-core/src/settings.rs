//! Persisted user settings abstraction.

use serde::{Deserialize, Serialize};

use crate::{
    pacing::{DEFAULT_BASE_SPEED, PacingConfig, PacingOverrides},
    segment::DEFAULT_WORDS_PER_CHUNK,
};

/// Reading location used to resume a document.
///
/// The offset is a byte position inside the section text, so it survives a
/// re-reconciliation that reshapes the chunks around it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResumeState {
    pub section_index: usize,
    pub source_offset: usize,
}

/// User-tunable settings that should survive restarts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSettings {
    pub speed: u16,
    pub words_per_chunk: u8,
    pub pacing: PacingOverrides,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<ResumeState>,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_SPEED as u16)
    }
}

impl PersistedSettings {
    pub const fn new(speed: u16) -> Self {
        Self {
            speed,
            words_per_chunk: DEFAULT_WORDS_PER_CHUNK as u8,
            pacing: PacingOverrides {
                base_speed: None,
                reference_speed: None,
                complexity_scale: None,
                complexity_sensitivity: None,
                complexity_attenuation: None,
                complexity_floor_ms: None,
                punctuation_scale: None,
                sentence_pause_ms: None,
                clause_pause_ms: None,
                default_pause_ms: None,
            },
            resume: None,
        }
    }

    pub const fn with_resume(mut self, resume: Option<ResumeState>) -> Self {
        self.resume = resume;
        self
    }

    /// Speed to read at. A finite `pacing.base_speed` override takes
    /// precedence over `speed`.
    pub fn base_speed(&self) -> u16 {
        match self.pacing.base_speed {
            Some(speed) if speed.is_finite() => {
                speed.round().clamp(1.0, f64::from(u16::MAX)) as u16
            }
            _ => self.speed.max(1),
        }
    }

    /// Pacing config with the stored overrides applied and [`Self::base_speed`]
    /// as base speed.
    pub fn pacing_config(&self) -> PacingConfig {
        PacingConfig {
            base_speed: f64::from(self.base_speed()),
            ..self.pacing.apply(PacingConfig::default())
        }
    }
}

/// Abstract settings persistence backend.
pub trait SettingsStore {
    type Error;

    fn load(&mut self) -> Result<Option<PersistedSettings>, Self::Error>;
    fn save(&mut self, settings: &PersistedSettings) -> Result<(), Self::Error>;
}

/// Volatile store, handy for hosts without persistence and for tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySettingsStore {
    saved: Option<PersistedSettings>,
    saves: u32,
}

impl MemorySettingsStore {
    pub const fn new() -> Self {
        Self {
            saved: None,
            saves: 0,
        }
    }

    pub fn save_count(&self) -> u32 {
        self.saves
    }
}

impl SettingsStore for MemorySettingsStore {
    type Error = core::convert::Infallible;

    fn load(&mut self) -> Result<Option<PersistedSettings>, Self::Error> {
        Ok(self.saved)
    }

    fn save(&mut self, settings: &PersistedSettings) -> Result<(), Self::Error> {
        self.saved = Some(*settings);
        self.saves = self.saves.saturating_add(1);
        Ok(())
    }
}
