//! Playback state machine for one reading session.
//!
//! The host calls [`PlaybackSession::tick`] from its timer loop with a
//! monotonic millisecond clock. Exactly one chunk is active at a time and the
//! only suspension point is the advance to the next chunk.

use core::ops::Range;

use log::{debug, info};

use crate::{
    pacing::{ChunkPacing, PacingConfig, PacingOverrides, pace_chunk},
    segment::{Chunk, Fragment, MergeMode, ReconcileOptions, Section, merge},
    settings::{PersistedSettings, ResumeState},
};

mod request_guard;

pub use request_guard::{RequestKey, SubmissionGuard};

const SPEED_STEP: u16 = 10;
const FRAGMENT_POLL_MS: u64 = 40;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
    /// Playback reached the end of the reconciled chunks while more fragments
    /// are still expected.
    AwaitingFragments,
    SectionFinished,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlaybackConfig {
    pub speed: u16,
    pub min_speed: u16,
    pub max_speed: u16,
    pub speed_step: u16,
    pub words_per_chunk: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 320,
            min_speed: 60,
            max_speed: 1_200,
            speed_step: SPEED_STEP,
            words_per_chunk: crate::segment::DEFAULT_WORDS_PER_CHUNK,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum PlayState {
    Stopped,
    Playing { next_chunk_ms: u64 },
    Paused,
    Finished,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AdvanceResult {
    Advanced,
    AwaitingFragments,
    EndOfSection,
}

pub struct PlaybackSession {
    config: PlaybackConfig,
    pacing: PacingConfig,
    reconcile: ReconcileOptions,
    section: Option<Section>,
    fragments_complete: bool,
    chunks: Vec<Chunk>,
    active: Option<usize>,
    pending_seek: Option<usize>,
    /// Active chunk was moved by a seek and has not been scheduled yet.
    reschedule: bool,
    /// Chunk to show on the next advance instead of the one after `active`.
    next: Option<usize>,
    /// While set, advancing skips already displayed chunks ending at or before
    /// this offset.
    backfill_until: Option<usize>,
    /// Section offset playback started from, by load or by the last seek.
    played_from: usize,
    /// Byte spans of the section already displayed.
    displayed: Vec<Range<usize>>,
    on_screen: Option<Range<usize>>,
    state: PlayState,
    pending_redraw: bool,
    chunks_shown: u32,
    guard: SubmissionGuard,
}

impl PlaybackSession {
    pub fn new(mut config: PlaybackConfig, mut pacing: PacingConfig) -> Self {
        if config.max_speed < config.min_speed {
            core::mem::swap(&mut config.max_speed, &mut config.min_speed);
        }
        config.min_speed = config.min_speed.max(1);
        config.max_speed = config.max_speed.max(config.min_speed);
        config.speed = config.speed.clamp(config.min_speed, config.max_speed);
        config.speed_step = config.speed_step.max(1);
        pacing.base_speed = f64::from(config.speed);

        Self {
            reconcile: ReconcileOptions::default().with_words_per_chunk(config.words_per_chunk),
            config,
            pacing,
            section: None,
            fragments_complete: false,
            chunks: Vec::new(),
            active: None,
            pending_seek: None,
            reschedule: false,
            next: None,
            backfill_until: None,
            played_from: 0,
            displayed: Vec::new(),
            on_screen: None,
            state: PlayState::Stopped,
            pending_redraw: true,
            chunks_shown: 0,
            guard: SubmissionGuard::new(),
        }
    }

    /// Session configured from persisted settings.
    pub fn from_settings(config: PlaybackConfig, settings: &PersistedSettings) -> Self {
        let config = PlaybackConfig {
            speed: settings.base_speed(),
            words_per_chunk: usize::from(settings.words_per_chunk.max(1)),
            ..config
        };
        Self::new(config, settings.pacing_config())
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn pacing(&self) -> &PacingConfig {
        &self.pacing
    }

    /// Replaces the pacing knobs, including the base speed. Takes effect on
    /// the next computed duration.
    pub fn set_pacing(&mut self, pacing: PacingConfig) {
        let speed = if pacing.base_speed.is_finite() {
            pacing.base_speed.round().clamp(0.0, f64::from(u16::MAX)) as u16
        } else {
            self.config.speed
        };
        self.pacing = pacing;
        self.set_speed(speed);
    }

    pub fn speed(&self) -> u16 {
        self.config.speed
    }

    pub fn set_speed(&mut self, speed: u16) {
        self.config.speed = speed.clamp(self.config.min_speed, self.config.max_speed);
        self.pacing.base_speed = f64::from(self.config.speed);
    }

    /// Steps the speed by the configured increment, returning whether it
    /// changed.
    pub fn adjust_speed(&mut self, increase: bool) -> bool {
        let next = if increase {
            self.config
                .speed
                .saturating_add(self.config.speed_step)
                .min(self.config.max_speed)
        } else {
            self.config
                .speed
                .saturating_sub(self.config.speed_step)
                .max(self.config.min_speed)
        };

        if next != self.config.speed {
            self.set_speed(next);
            true
        } else {
            false
        }
    }

    pub fn section(&self) -> Option<&Section> {
        self.section.as_ref()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn current_chunk(&self) -> Option<&Chunk> {
        self.active.and_then(|index| self.chunks.get(index))
    }

    /// `(position, total)` with a 1-based position, `0` before the first chunk.
    pub fn progress(&self) -> (usize, usize) {
        (self.active.map_or(0, |index| index + 1), self.chunks.len())
    }

    pub fn fragments_complete(&self) -> bool {
        self.fragments_complete
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlayState::Playing { .. })
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlayState::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.state == PlayState::Finished
    }

    pub fn chunks_shown(&self) -> u32 {
        self.chunks_shown
    }

    /// Timing breakdown of the active chunk under the current settings.
    pub fn current_pacing(&self) -> Option<ChunkPacing> {
        self.current_chunk()
            .map(|chunk| pace_chunk(chunk, self.pacing.base_speed, &self.pacing))
    }

    /// Snapshot of the user-facing settings for persistence. A base speed
    /// override in `base` is folded into `speed`.
    pub fn persisted_settings(&self, base: &PersistedSettings) -> PersistedSettings {
        PersistedSettings {
            speed: self.config.speed,
            words_per_chunk: self.config.words_per_chunk.clamp(1, u8::MAX as usize) as u8,
            pacing: PacingOverrides {
                base_speed: None,
                ..base.pacing
            },
            ..*base
        }
        .with_resume(self.resume_state())
    }

    pub fn resume_state(&self) -> Option<ResumeState> {
        let section = self.section.as_ref()?;
        Some(ResumeState {
            section_index: section.index,
            source_offset: self.current_chunk().map_or(0, |chunk| chunk.start),
        })
    }
}

include!("runtime.rs");
include!("navigation.rs");
