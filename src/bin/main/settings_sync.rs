use flow_core::settings::{PersistedSettings, SettingsStore};
use log::{debug, warn};

use super::SETTINGS_SAVE_DEBOUNCE_MS;

pub(super) struct SettingsSyncState {
    last_saved: PersistedSettings,
    pending: Option<(PersistedSettings, u64)>,
}

impl SettingsSyncState {
    pub(super) fn new(initial: PersistedSettings) -> Self {
        Self {
            last_saved: initial,
            pending: None,
        }
    }

    pub(super) fn last_saved(&self) -> &PersistedSettings {
        &self.last_saved
    }

    pub(super) fn track_current(&mut self, current: PersistedSettings, now_ms: u64) {
        if current == self.last_saved {
            self.pending = None;
            return;
        }

        match self.pending.as_mut() {
            Some((pending, changed_at_ms)) => {
                if *pending != current {
                    *pending = current;
                    *changed_at_ms = now_ms;
                }
            }
            None => {
                self.pending = Some((current, now_ms));
            }
        }
    }

    pub(super) fn flush_if_due<S>(&mut self, store: &mut S, now_ms: u64)
    where
        S: SettingsStore,
        S::Error: core::fmt::Display,
    {
        let Some((candidate, changed_at_ms)) = self.pending else {
            return;
        };

        if now_ms.saturating_sub(changed_at_ms) < SETTINGS_SAVE_DEBOUNCE_MS {
            return;
        }

        match store.save(&candidate) {
            Ok(()) => {
                debug!("settings: saved at {now_ms} ms");
                self.last_saved = candidate;
                self.pending = None;
            }
            Err(err) => {
                // Keep pending changes and retry after another debounce window.
                warn!("settings: save failed, will retry: {err}");
                self.pending = Some((candidate, now_ms));
            }
        }
    }

    /// Saves any pending change immediately.
    pub(super) fn flush<S: SettingsStore>(&mut self, store: &mut S) -> Result<(), S::Error> {
        let Some((candidate, _)) = self.pending.take() else {
            return Ok(());
        };
        store.save(&candidate)?;
        self.last_saved = candidate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use flow_core::settings::MemorySettingsStore;

    use super::*;

    #[test]
    fn saves_only_after_debounce_window() {
        let mut store = MemorySettingsStore::new();
        let mut sync = SettingsSyncState::new(PersistedSettings::new(320));

        sync.track_current(PersistedSettings::new(330), 100);
        sync.flush_if_due(&mut store, 100 + SETTINGS_SAVE_DEBOUNCE_MS - 1);
        assert_eq!(store.save_count(), 0);

        sync.flush_if_due(&mut store, 100 + SETTINGS_SAVE_DEBOUNCE_MS);
        assert_eq!(store.save_count(), 1);
        assert_eq!(sync.last_saved().speed, 330);
    }

    #[test]
    fn further_changes_restart_the_window() {
        let mut store = MemorySettingsStore::new();
        let mut sync = SettingsSyncState::new(PersistedSettings::new(320));

        sync.track_current(PersistedSettings::new(330), 0);
        sync.track_current(PersistedSettings::new(340), 1_000);
        sync.flush_if_due(&mut store, SETTINGS_SAVE_DEBOUNCE_MS);
        assert_eq!(store.save_count(), 0);

        sync.flush_if_due(&mut store, 1_000 + SETTINGS_SAVE_DEBOUNCE_MS);
        assert_eq!(store.load().unwrap().map(|s| s.speed), Some(340));
    }

    #[test]
    fn reverting_to_saved_cancels_pending() {
        let mut store = MemorySettingsStore::new();
        let mut sync = SettingsSyncState::new(PersistedSettings::new(320));

        sync.track_current(PersistedSettings::new(330), 0);
        sync.track_current(PersistedSettings::new(320), 10);
        sync.flush(&mut store).unwrap();
        assert_eq!(store.save_count(), 0);
    }
}
