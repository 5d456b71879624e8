use flow_core::{
    segment::{Fragment, Section, filler_chunks},
    session::{PlaybackSession, TickResult},
    settings::{ResumeState, SettingsStore},
    text_policy::{preview_limited, progress_label},
};
use log::{debug, info, warn};

use super::settings_sync::SettingsSyncState;

const PREVIEW_WORDS: usize = 8;
const PREVIEW_CHARS: usize = 48;
const PREVIEW_BYTES: usize = 64;

pub(super) struct ReplayOptions {
    /// Number of growing fragment prefixes delivered per section.
    pub(super) stream_steps: usize,
    pub(super) stream_interval_ms: u64,
    pub(super) resume: Option<ResumeState>,
}

#[derive(Debug, Default)]
pub(super) struct ReplaySummary {
    pub(super) chunks_shown: u32,
    pub(super) elapsed_ms: u64,
    pub(super) empty_sections: usize,
}

/// Plays every section against a simulated clock, delivering its fragments
/// in growing prefixes the way a streaming model response arrives.
pub(super) fn replay_document<S>(
    sections: &[Section],
    per_section: &[Vec<Fragment>],
    session: &mut PlaybackSession,
    sync: &mut SettingsSyncState,
    store: &mut S,
    options: &ReplayOptions,
) -> ReplaySummary
where
    S: SettingsStore,
    S::Error: core::fmt::Display,
{
    let mut summary = ReplaySummary::default();
    let mut now_ms = 0u64;

    let resume = options
        .resume
        .filter(|resume| resume.section_index < sections.len());
    let first = resume.map_or(0, |resume| resume.section_index);
    if first > 0 {
        info!("resuming at section {first}");
    }

    for section in &sections[first..] {
        let mut fragments = per_section.get(section.index).map_or(&[][..], Vec::as_slice);
        let fallback: Vec<Fragment>;

        session.load_section(section.clone());
        if session.should_request_segmentation() {
            debug!(
                "segmentation requested for section {} ({:?})",
                section.index,
                session.request_key()
            );
        }

        if fragments.is_empty() {
            warn!(
                "section {} has no fragments, reading it as plain word groups",
                section.index
            );
            fallback = filler_fragments(section, session.config().words_per_chunk);
            fragments = fallback.as_slice();
            summary.empty_sections += 1;
        }

        if let Some(resume) = resume {
            if session.restore(resume) {
                debug!("seeking to byte {} of section {}", resume.source_offset, section.index);
            }
        }

        println!(
            "== {} \"{}\"",
            progress_label(section.index + 1, sections.len(), "sec"),
            section.label()
        );
        now_ms = play_section(session, fragments, sync, store, options, now_ms);
    }

    summary.chunks_shown = session.chunks_shown();
    summary.elapsed_ms = now_ms;
    summary
}

fn play_section<S>(
    session: &mut PlaybackSession,
    fragments: &[Fragment],
    sync: &mut SettingsSyncState,
    store: &mut S,
    options: &ReplayOptions,
    mut now_ms: u64,
) -> u64
where
    S: SettingsStore,
    S::Error: core::fmt::Display,
{
    let steps = options.stream_steps.max(1);
    let mut delivered = 0usize;
    let mut next_delivery_ms = now_ms;
    let mut last_shown: Option<(usize, usize)> = None;

    session.play(now_ms);

    loop {
        if delivered < steps && now_ms >= next_delivery_ms {
            delivered += 1;
            let prefix = (fragments.len() * delivered).div_ceil(steps);
            session.apply_fragments(&fragments[..prefix], delivered == steps);
            next_delivery_ms = now_ms + options.stream_interval_ms;
        }

        match session.tick(now_ms) {
            TickResult::RenderRequested => {
                if let Some(chunk) = session.current_chunk() {
                    let shown = (chunk.start, chunk.end);
                    if last_shown != Some(shown) {
                        last_shown = Some(shown);
                        print_row(session, now_ms);
                    }
                }
            }
            TickResult::SectionFinished => break,
            TickResult::AwaitingFragments | TickResult::NoRender => {}
        }

        sync.track_current(session.persisted_settings(sync.last_saved()), now_ms);
        sync.flush_if_due(store, now_ms);

        let Some(wait_ms) = session.time_to_next_ms(now_ms) else {
            break;
        };
        let wait_ms = if delivered < steps {
            wait_ms.min(next_delivery_ms.saturating_sub(now_ms))
        } else {
            wait_ms
        };
        now_ms += wait_ms.max(1);
    }

    now_ms
}

/// Fragments equivalent to reconciling `section` with nothing but filler.
fn filler_fragments(section: &Section, words_per_chunk: usize) -> Vec<Fragment> {
    filler_chunks(&section.text, 0, section.text.len(), words_per_chunk)
        .into_iter()
        .map(|chunk| Fragment::new(chunk.text, f64::from(chunk.complexity)))
        .collect()
}

fn print_row(session: &PlaybackSession, now_ms: u64) {
    let (Some(chunk), Some(pacing)) = (session.current_chunk(), session.current_pacing()) else {
        return;
    };
    let (position, total) = session.progress();
    let total_label = if session.fragments_complete() {
        progress_label(position, total, "")
    } else {
        progress_label(position, total, "+")
    };

    println!(
        "{:>8} ms  {:<10} {:>5} ms  c={:.2}  {}",
        now_ms,
        total_label,
        pacing.display_ms(),
        chunk.complexity,
        preview_limited::<PREVIEW_BYTES>(&chunk.text, PREVIEW_WORDS, PREVIEW_CHARS)
    );
}
