use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backup;
use crate::error::AppError;
use crate::project::{read_json, write_json, ReadError};

const SETTINGS_VERSION: u32 = 1;

/// Tool-server settings stored in the config directory as `settings.json`.
/// Unknown or missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub version: u32,
    /// Backups kept per data file after each write.
    pub backup_keep: usize,
    /// Append every tool call to `tool-logs/YYYY-MM-DD.jsonl`.
    pub audit_log: bool,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            backup_keep: backup::DEFAULT_KEEP,
            audit_log: true,
            log_filter: "info".to_string(),
        }
    }
}

/// Load settings from the config directory. A missing file yields the
/// defaults; an unreadable one is an error.
pub fn load_settings(config_dir: &Path) -> Result<Settings, AppError> {
    let path = crate::paths::settings_path(config_dir);
    match read_json::<Settings>(&path) {
        Ok(settings) => Ok(settings),
        Err(ReadError::NotFound) => Ok(Settings::default()),
        Err(e) => Err(e.into_data_error(crate::paths::SETTINGS_FILE)),
    }
}

pub fn save_settings(config_dir: &Path, settings: &Settings) -> Result<(), AppError> {
    std::fs::create_dir_all(config_dir).map_err(|e| AppError::io(config_dir.display(), &e))?;
    write_json(&crate::paths::settings_path(config_dir), settings)
}
