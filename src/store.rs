//! Project-scoped access to map and database files.
//!
//! There is no cache: every call reads the file it needs and every save
//! rewrites the whole file through the backup layer.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backup;
use crate::error::AppError;
use crate::mz::plugins::{self, PluginEntry};
use crate::mz::{EventCommand, MapData};
use crate::paths;
use crate::project::{self, ReadError};

#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
    backup_keep: usize,
}

impl ProjectStore {
    /// Open a project after checking it is an MZ project directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let root = root.into();
        project::validate_project_path(&root)?;
        Ok(Self {
            root,
            backup_keep: backup::DEFAULT_KEEP,
        })
    }

    /// Number of backups kept per file after each save.
    pub fn with_backup_keep(mut self, keep: usize) -> Self {
        self.backup_keep = keep;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_keep(&self) -> usize {
        self.backup_keep
    }

    pub fn map_path(&self, map_id: u32) -> PathBuf {
        paths::map_file(&self.root, map_id)
    }

    /// Guarded path of a caller-named data file.
    pub fn data_path(&self, filename: &str) -> Result<PathBuf, AppError> {
        project::resolve_data_file(&self.root, filename)
    }

    // ── Maps ────────────────────────────────────────────────────────

    pub fn load_map(&self, map_id: u32) -> Result<MapData, AppError> {
        let path = self.map_path(map_id);
        project::read_json(&path).map_err(|e| match e {
            ReadError::NotFound => AppError::MapNotFound { map_id },
            ReadError::Parse(e) => AppError::MapCorrupt {
                map_id,
                reason: e.to_string(),
            },
            ReadError::Io(e) => AppError::io(path.display(), &e),
        })
    }

    pub fn save_map(&self, map_id: u32, map: &MapData) -> Result<(), AppError> {
        let json = project::to_pretty_json(map)?;
        self.write_protected(&self.map_path(map_id), json.as_bytes())
    }

    /// Load a map, run `edit` on one page's list, and save. Nothing is written
    /// when `edit` fails.
    pub fn edit_page<R>(
        &self,
        map_id: u32,
        event_id: u32,
        page_index: usize,
        edit: impl FnOnce(&mut Vec<EventCommand>) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut map = self.load_map(map_id)?;
        let list = resolve_page(&mut map, map_id, event_id, page_index)?;
        let out = edit(list)?;
        self.save_map(map_id, &map)?;
        Ok(out)
    }

    // ── Generic data files ──────────────────────────────────────────

    pub fn read_data<T: DeserializeOwned>(&self, filename: &str) -> Result<T, AppError> {
        let path = self.data_path(filename)?;
        project::read_json(&path).map_err(|e| e.into_data_error(filename))
    }

    pub fn read_data_value(&self, filename: &str) -> Result<Value, AppError> {
        self.read_data(filename)
    }

    /// Read a data file, or `None` when it does not exist yet.
    pub fn read_data_opt<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>, AppError> {
        match self.read_data(filename) {
            Ok(v) => Ok(Some(v)),
            Err(AppError::DataFileNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn write_data_value<T: Serialize + ?Sized>(&self, filename: &str, value: &T) -> Result<(), AppError> {
        let path = self.data_path(filename)?;
        let json = project::to_pretty_json(value)?;
        self.write_protected(&path, json.as_bytes())
    }

    /// Write caller-supplied text verbatim. It must parse as JSON.
    pub fn write_data_raw(&self, filename: &str, content: &str) -> Result<(), AppError> {
        if let Err(e) = serde_json::from_str::<serde::de::IgnoredAny>(content) {
            return Err(AppError::invalid("content", format!("not valid JSON: {e}")));
        }
        let path = self.data_path(filename)?;
        self.write_protected(&path, content.as_bytes())
    }

    // ── Plugins ─────────────────────────────────────────────────────

    pub fn read_plugins(&self) -> Result<Vec<PluginEntry>, AppError> {
        let path = paths::plugins_config(&self.root);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::PluginFileNotFound {
                    filename: paths::PLUGINS_CONFIG_FILE.to_string(),
                }
            } else {
                AppError::io(path.display(), &e)
            }
        })?;
        plugins::parse(&text).map_err(|reason| AppError::PluginFileCorrupt {
            filename: paths::PLUGINS_CONFIG_FILE.to_string(),
            reason,
        })
    }

    /// Rewrite `js/plugins.js` in the editor's layout.
    pub fn write_plugins(&self, list: &[PluginEntry]) -> Result<(), AppError> {
        let text = plugins::render(list).map_err(|e| AppError::Io {
            message: format!("failed to serialize plugin list: {e}"),
        })?;
        let path = paths::plugins_config(&self.root);
        ensure_dir(&self.root.join(paths::JS_DIR))?;
        self.write_protected(&path, text.as_bytes())
    }

    /// Write a plugin source file into `js/plugins`, creating the directory
    /// on first use.
    pub fn write_plugin_source(&self, filename: &str, code: &str) -> Result<(), AppError> {
        project::check_plugin_name(filename)?;
        ensure_dir(&paths::plugins_dir(&self.root))?;
        let path = project::resolve_plugin_file(&self.root, filename)?;
        self.write_protected(&path, code.as_bytes())
    }

    /// Backup, atomic write, rollback on failure, then best-effort pruning.
    fn write_protected(&self, path: &Path, bytes: &[u8]) -> Result<(), AppError> {
        backup::with_backup(path, || project::atomic_write(path, bytes))?;
        tracing::info!(file = %path.display(), bytes = bytes.len(), "wrote data file");
        backup::prune_backups(path, self.backup_keep);
        Ok(())
    }
}

fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(dir).map_err(|e| AppError::io(dir.display(), &e))
}

/// Mutable reference to one page's command list, so edits are persisted by a
/// later [`ProjectStore::save_map`].
pub fn resolve_page(
    map: &mut MapData,
    map_id: u32,
    event_id: u32,
    page_index: usize,
) -> Result<&mut Vec<EventCommand>, AppError> {
    let event = map
        .events
        .get_mut(event_id)
        .ok_or(AppError::EventNotFound { map_id, event_id })?;
    event
        .pages
        .get_mut(page_index)
        .map(|page| &mut page.list)
        .ok_or(AppError::PageNotFound {
            map_id,
            event_id,
            page_index,
        })
}

/// Read-only counterpart of [`resolve_page`].
pub fn page(
    map: &MapData,
    map_id: u32,
    event_id: u32,
    page_index: usize,
) -> Result<&[EventCommand], AppError> {
    let event = map
        .events
        .get(event_id)
        .ok_or(AppError::EventNotFound { map_id, event_id })?;
    event
        .pages
        .get(page_index)
        .map(|page| page.list.as_slice())
        .ok_or(AppError::PageNotFound {
            map_id,
            event_id,
            page_index,
        })
}
