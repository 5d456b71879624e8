use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use flow_core::{
    segment::{DEFAULT_SECTION_BYTES, Fragment, Section, split_sections},
    session::{PlaybackConfig, PlaybackSession},
    settings::{MemorySettingsStore, SettingsStore},
};
use log::{LevelFilter, info, warn};

use fragments_file::FragmentsFile;
use replay::{ReplayOptions, replay_document};
use settings_file::FileSettingsStore;
use settings_sync::SettingsSyncState;

#[path = "main/fragments_file.rs"]
mod fragments_file;
#[path = "main/replay.rs"]
mod replay;
#[path = "main/settings_file.rs"]
mod settings_file;
#[path = "main/settings_sync.rs"]
mod settings_sync;

const SETTINGS_SAVE_DEBOUNCE_MS: u64 = 1_500;
const STREAM_INTERVAL_MS: u64 = 400;

/// Replays model fragments for a document through the RSVP chunk player and
/// prints the resulting timeline.
#[derive(Debug, Parser)]
#[command(name = "readily-flow")]
struct Cli {
    /// Plain-text document to read.
    text: PathBuf,

    /// JSON fragments: an array for the whole document, or an object keyed by
    /// section index. Sections left without fragments are read as plain
    /// word groups.
    fragments: PathBuf,

    /// JSON settings file, created or updated when settings change.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Base speed in chunks per minute.
    #[arg(long)]
    speed: Option<u16>,

    /// Words per filler chunk.
    #[arg(long)]
    words_per_chunk: Option<u8>,

    /// Maximum section size in bytes.
    #[arg(long, default_value_t = DEFAULT_SECTION_BYTES)]
    section_bytes: usize,

    /// Number of partial updates each section's fragments arrive in.
    #[arg(long, default_value_t = 4)]
    stream_steps: usize,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level.parse().unwrap_or(LevelFilter::Info))
        .init();

    let document = fs::read_to_string(&cli.text)
        .with_context(|| format!("failed to read text file {}", cli.text.display()))?;
    let fragments = FragmentsFile::load(&cli.fragments)?;

    let sections = split_sections(&document, cli.section_bytes);
    info!(
        "loaded {} bytes in {} sections from {}",
        document.len(),
        sections.len(),
        cli.text.display()
    );
    let per_section = fragments.assign(&document, &sections);

    match cli.settings.clone() {
        Some(path) => {
            let mut store = FileSettingsStore::new(path);
            run(&cli, &sections, &per_section, &mut store)
        }
        None => run(&cli, &sections, &per_section, &mut MemorySettingsStore::new()),
    }
}

fn run<S>(
    cli: &Cli,
    sections: &[Section],
    per_section: &[Vec<Fragment>],
    store: &mut S,
) -> Result<()>
where
    S: SettingsStore,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let stored = store
        .load()
        .context("failed to load settings")?
        .unwrap_or_default();
    let mut settings = stored;
    if let Some(speed) = cli.speed {
        settings.speed = speed;
    }
    if let Some(words_per_chunk) = cli.words_per_chunk {
        settings.words_per_chunk = words_per_chunk;
    }

    let mut session = PlaybackSession::from_settings(PlaybackConfig::default(), &settings);
    if let Some(resume) = settings.resume {
        info!(
            "stored position: section {} byte {}",
            resume.section_index, resume.source_offset
        );
    }

    let mut sync = SettingsSyncState::new(stored);
    let options = ReplayOptions {
        stream_steps: cli.stream_steps.max(1),
        stream_interval_ms: STREAM_INTERVAL_MS,
        resume: settings.resume,
    };
    let summary = replay_document(sections, per_section, &mut session, &mut sync, store, &options);

    if let Err(err) = sync.flush(store) {
        warn!("settings were not saved: {err}");
    }

    info!(
        "shown {} chunks over {:.1} s of simulated reading, {} sections read without fragments",
        summary.chunks_shown,
        summary.elapsed_ms as f64 / 1_000.0,
        summary.empty_sections
    );
    Ok(())
}
