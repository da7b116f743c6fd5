// Studio configuration
//
// Read from a JSON file; every field is optional and falls back to its
// default so a partial or missing file still yields a usable config.

use crate::audio::DEFAULT_NARRATION_SAMPLE_RATE;
use crate::history::DEFAULT_MAX_HISTORY;
use crate::project::autosave::DEFAULT_AUTOSAVE_DELAY;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "storyboard-studio";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write config: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct StudioConfig {
    /// Where the project record is stored
    pub storage_dir: PathBuf,
    pub history_limit: usize,
    pub autosave_delay_ms: u64,
    pub narration_sample_rate: u32,
    pub default_voice: String,
    pub notification_capacity: usize,
    pub message_capacity: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            history_limit: DEFAULT_MAX_HISTORY,
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY.as_millis() as u64,
            narration_sample_rate: DEFAULT_NARRATION_SAMPLE_RATE,
            default_voice: "Kore".to_string(),
            notification_capacity: 256,
            message_capacity: 512,
        }
    }
}

/// `<data dir>/storyboard-studio`, or a relative directory when the platform has none
pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl StudioConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: StudioConfig =
            serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Loaded config from {}", path.display());
        Ok(config.sanitized())
    }

    /// Load `path` if given, else the default location; a missing file yields defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if path.exists() {
            Self::load(&path)
        } else {
            info!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Capacities of zero are raised to one
    pub fn sanitized(mut self) -> Self {
        self.history_limit = self.history_limit.max(1);
        self.notification_capacity = self.notification_capacity.max(1);
        self.message_capacity = self.message_capacity.max(1);
        if self.narration_sample_rate == 0 {
            self.narration_sample_rate = DEFAULT_NARRATION_SAMPLE_RATE;
        }
        self
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}
