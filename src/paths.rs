//! Centralized path definitions for project files and the tool's own config.
//!
//! This module is the single source of truth for leaf filenames, directory names,
//! and path-building functions. No other module should hard-code these strings.
//! Backup names are the exception: they live in [`crate::backup::naming`].

use std::path::{Path, PathBuf};

// ── Application identity ─────────────────────────────────────────

pub const APP_DIR_NAME: &str = "rmmz-tools";

// ── Config-dir leaf names ────────────────────────────────────────

pub const SETTINGS_FILE: &str = "settings.json";
pub const TOOL_LOGS_DIR: &str = "tool-logs";

// ── Project layout ───────────────────────────────────────────────

pub const PROJECT_MARKER: &str = "game.rmmzproject";
pub const DATA_DIR: &str = "data";
pub const IMG_DIR: &str = "img";
pub const AUDIO_DIR: &str = "audio";
pub const JS_DIR: &str = "js";
pub const PLUGINS_DIR: &str = "plugins";
pub const PLUGINS_JS: &str = "plugins.js";
/// Plugin manager list, relative to the project root.
pub const PLUGINS_CONFIG_FILE: &str = "js/plugins.js";

pub const SYSTEM_FILE: &str = "System.json";
pub const MAP_INFOS_FILE: &str = "MapInfos.json";
pub const COMMON_EVENTS_FILE: &str = "CommonEvents.json";
pub const TROOPS_FILE: &str = "Troops.json";
pub const ACTORS_FILE: &str = "Actors.json";
pub const ITEMS_FILE: &str = "Items.json";
pub const SKILLS_FILE: &str = "Skills.json";

// ── Config-dir functions ─────────────────────────────────────────

/// `--config-dir` if given, else the platform config dir, else `./.rmmz-tools`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir().map_or_else(
        || PathBuf::from(format!(".{APP_DIR_NAME}")),
        |d| d.join(APP_DIR_NAME),
    )
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

pub fn tool_logs_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(TOOL_LOGS_DIR)
}

// ── Project functions (take project root) ────────────────────────

pub fn project_marker(project: &Path) -> PathBuf {
    project.join(PROJECT_MARKER)
}

pub fn data_dir(project: &Path) -> PathBuf {
    project.join(DATA_DIR)
}

pub fn data_file(project: &Path, filename: &str) -> PathBuf {
    data_dir(project).join(filename)
}

/// `<project>/js/plugins`, where plugin sources live.
pub fn plugins_dir(project: &Path) -> PathBuf {
    project.join(JS_DIR).join(PLUGINS_DIR)
}

/// `<project>/js/plugins.js`
pub fn plugins_config(project: &Path) -> PathBuf {
    project.join(JS_DIR).join(PLUGINS_JS)
}

/// `Map007.json`
pub fn map_file_name(map_id: u32) -> String {
    format!("Map{map_id:03}.json")
}

pub fn map_file(project: &Path, map_id: u32) -> PathBuf {
    data_file(project, &map_file_name(map_id))
}

/// Inverse of [`map_file_name`]. `MapInfos.json` and friends return `None`.
pub fn parse_map_file_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("Map")?.strip_suffix(".json")?;
    if digits.len() < 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
