//! User settings for the audio helper.
//!
//! Settings live in `config.json` under the platform config directory. Every
//! field is optional; a missing file yields the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Display name of the managed aggregate device.
pub const DEFAULT_AGGREGATE_NAME: &str = "LedFx Audio System";

/// UID of the managed aggregate device.
pub const DEFAULT_AGGREGATE_UID: &str = "com.ledfx.aggregate.auto";

/// Loopback driver looked up by `enable` when no name is given.
pub const DEFAULT_DRIVER: &str = "LedFx";

/// Step for `volume up` / `volume down`, in percent.
pub const DEFAULT_VOLUME_STEP: f32 = 5.0;

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub aggregate_name: String,
    pub aggregate_uid: String,
    pub default_driver: String,
    /// Substrings of names/UIDs never picked as fallback output on `disable`
    /// (virtual drivers and meeting software devices).
    pub fallback_denylist: Vec<String>,
    pub volume_step: f32,
    /// Directory for the mute volume stash. Defaults to the system temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stash_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aggregate_name: DEFAULT_AGGREGATE_NAME.to_string(),
            aggregate_uid: DEFAULT_AGGREGATE_UID.to_string(),
            default_driver: DEFAULT_DRIVER.to_string(),
            fallback_denylist: ["LedFx", "aggregate", "Zoom", "Teams"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            volume_step: DEFAULT_VOLUME_STEP,
            stash_dir: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, AudioError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| AudioError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let settings: Settings =
            serde_json::from_str(&contents).map_err(|e| AudioError::Config {
                path: path.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Directory used by the file-backed volume stash.
    pub fn stash_dir(&self) -> PathBuf {
        self.stash_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// `<config dir>/ledfx-audio/config.json`, if a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "LedFx", "ledfx-audio")
        .map(|d| d.config_dir().join(CONFIG_FILE))
}
