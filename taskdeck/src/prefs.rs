//! Local display preferences.
//!
//! Unlike [`crate::config`], preferences are written back by the client
//! when the user changes them (theme toggle). Stored as TOML at
//! `~/.config/taskdeck/prefs.toml`. Load and store failures are logged
//! and otherwise ignored: a missing or broken prefs file must never
//! prevent startup.

use std::path::PathBuf;

/// Persisted display preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Prefs {
    /// Render with the dark palette.
    pub dark_mode: bool,
}

impl Default for Prefs {
    fn default() -> Self {
        Self { dark_mode: true }
    }
}

impl Prefs {
    /// Load preferences from `path`, or the default location when `None`.
    /// Falls back to defaults on any failure.
    #[must_use]
    pub fn load(path: Option<PathBuf>) -> Self {
        let Some(path) = path.or_else(default_path) else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(prefs) => prefs,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable prefs file");
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read prefs file");
                Self::default()
            }
        }
    }

    /// Write preferences to `path`, or the default location when `None`.
    /// Failures are logged, not propagated.
    pub fn store(&self, path: Option<PathBuf>) {
        let Some(path) = path.or_else(default_path) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "failed to create prefs directory");
                return;
            }
        }
        match toml::to_string_pretty(self) {
            Ok(contents) => {
                if let Err(e) = std::fs::write(&path, contents) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to write prefs file");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize prefs"),
        }
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskdeck").join("prefs.toml"))
}
