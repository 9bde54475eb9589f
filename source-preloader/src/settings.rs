//! Persisted CLI settings
//!
//! A small JSON file next to the executable's working directory remembers
//! the last game directory between runs. Load failures fall back to
//! defaults; save failures are logged and otherwise ignored.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings file name, relative to the working directory
pub const SETTINGS_FILE: &str = "preloader-settings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Last known working game directory
    #[serde(default)]
    pub last_directory: String,
}

impl Settings {
    /// Load settings from the default location
    pub fn load() -> Self {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    /// Load settings from an explicit path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                log::warn!("ignoring unreadable settings file {}: {err}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to the default location; failures are logged only
    pub fn save(&self) {
        self.save_to(Path::new(SETTINGS_FILE));
    }

    /// Save settings to an explicit path; failures are logged only
    pub fn save_to(&self, path: &Path) {
        let rendered = match serde_json::to_string_pretty(self) {
            Ok(rendered) => rendered,
            Err(err) => {
                log::warn!("could not serialize settings: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(path, rendered) {
            log::warn!("could not save settings to {}: {err}", path.display());
        }
    }
}
