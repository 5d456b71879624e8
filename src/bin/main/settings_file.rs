use std::{fs, io, path::PathBuf};

use flow_core::settings::{PersistedSettings, SettingsStore};
use thiserror::Error;

#[derive(Debug, Error)]
pub(super) enum SettingsFileError {
    #[error("I/O error on settings file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file {} is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings persisted as pretty-printed JSON. A missing file loads as `None`.
pub(super) struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub(super) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn io_error(&self, source: io::Error) -> SettingsFileError {
        SettingsFileError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> SettingsFileError {
        SettingsFileError::Json {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsStore for FileSettingsStore {
    type Error = SettingsFileError;

    fn load(&mut self) -> Result<Option<PersistedSettings>, Self::Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| self.json_error(err))
    }

    fn save(&mut self, settings: &PersistedSettings) -> Result<(), Self::Error> {
        let raw = serde_json::to_string_pretty(settings).map_err(|err| self.json_error(err))?;
        fs::write(&self.path, raw).map_err(|err| self.io_error(err))
    }
}
