//! Project validation and the low-level JSON file layer.
//!
//! Every write in the crate ends in [`atomic_write`]; every read of a project
//! data file goes through [`read_json`]. Higher layers (store, backup) decide
//! which [`AppError`] a [`ReadError`] becomes.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppError;
use crate::paths;

// ── Read errors ─────────────────────────────────────────────────────

/// Why a JSON file could not be read. Callers map this onto the
/// resource-specific [`AppError`] variant.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("file not found")]
    NotFound,
    #[error("{0}")]
    Io(std::io::Error),
    #[error("{0}")]
    Parse(#[from] serde_json::Error),
}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            ReadError::NotFound
        } else {
            ReadError::Io(e)
        }
    }
}

impl ReadError {
    /// Map onto the generic data-file errors.
    pub fn into_data_error(self, filename: &str) -> AppError {
        match self {
            ReadError::NotFound => AppError::DataFileNotFound {
                filename: filename.to_string(),
            },
            ReadError::Io(e) => AppError::io(filename, &e),
            ReadError::Parse(e) => AppError::DataFileCorrupt {
                filename: filename.to_string(),
                reason: e.to_string(),
            },
        }
    }
}

// ── Atomic writes ───────────────────────────────────────────────────

/// Per-file mutex map to serialize concurrent writes to the same path.
/// An entry lives only while some writer holds or waits on it.
static FILE_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Atomically write bytes to a file using write-to-temp-then-rename.
///
/// 1. Acquires a per-file mutex to prevent concurrent writes to the same path
/// 2. Writes data to a `.tmp` sibling file
/// 3. Calls `fsync` to flush to disk
/// 4. Renames the `.tmp` file to the target path
///
/// Snapshots of the previous content are the backup layer's job, not this one.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    let lock = {
        let mut locks = FILE_LOCKS.lock();
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    };
    let result = {
        let _guard = lock.lock();
        replace_file(path, data)
    };

    // The map and `lock` are the only owners when nobody else is waiting.
    let mut locks = FILE_LOCKS.lock();
    if Arc::strong_count(&lock) == 2 {
        locks.remove(path);
    }
    result
}

fn replace_file(path: &Path, data: &[u8]) -> Result<(), AppError> {
    // foo.json → foo.json.tmp
    let file_name = path.file_name().unwrap_or_default();
    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let write_tmp = || -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()
    };
    if let Err(e) = write_tmp() {
        let _ = fs::remove_file(&tmp_path);
        return Err(AppError::io(path.display(), &e));
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        AppError::io(path.display(), &e)
    })
}

/// Canonical on-disk form: 2-space pretty JSON.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| AppError::Io {
        message: format!("failed to serialize JSON: {e}"),
    })
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let json = to_pretty_json(value)?;
    atomic_write(path, json.as_bytes())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ReadError> {
    let data = fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

// ── Project validation ──────────────────────────────────────────────

/// Check that `root` is an RPG Maker MZ project: an existing directory that
/// contains `game.rmmzproject`.
pub fn validate_project_path(root: &Path) -> Result<(), AppError> {
    let meta = fs::metadata(root).map_err(|e| AppError::InvalidProject {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(AppError::InvalidProject {
            path: root.to_path_buf(),
            reason: format!("{} is not a directory", root.display()),
        });
    }
    if !paths::project_marker(root).is_file() {
        return Err(AppError::ProjectFileNotFound {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Resolve a caller-supplied data filename to a path inside `<project>/data`.
///
/// The name must end in `.json`, be relative and contain no `..`. When the
/// target (or, for a new file, its parent) exists, symlinks are resolved and
/// the real path must still be inside the real data directory.
pub fn resolve_data_file(project: &Path, filename: &str) -> Result<PathBuf, AppError> {
    let rel = checked_relative(filename, ".json")?;
    let real_data = fs::canonicalize(paths::data_dir(project)).map_err(|_| {
        AppError::DataFileNotFound {
            filename: filename.to_string(),
        }
    })?;
    confine(&real_data, rel, filename)
}

/// Resolve a plugin source filename to a path directly inside
/// `<project>/js/plugins`, which must exist. Same rules as
/// [`resolve_data_file`] with `.js` in place of `.json`, and no
/// subdirectories.
pub fn resolve_plugin_file(project: &Path, filename: &str) -> Result<PathBuf, AppError> {
    let rel = check_plugin_name(filename)?;
    let dir = paths::plugins_dir(project);
    let real_plugins = fs::canonicalize(&dir).map_err(|e| AppError::io(dir.display(), &e))?;
    confine(&real_plugins, rel, filename)
}

/// Name-only half of [`resolve_plugin_file`]: a single `.js` file name.
pub fn check_plugin_name(filename: &str) -> Result<&Path, AppError> {
    let rel = checked_relative(filename, ".js")?;
    if rel.components().count() != 1 {
        return Err(AppError::PathTraversal {
            path: filename.to_string(),
        });
    }
    Ok(rel)
}

fn checked_relative<'a>(filename: &'a str, extension: &str) -> Result<&'a Path, AppError> {
    let stem = filename.strip_suffix(extension).unwrap_or_default();
    if stem.is_empty() {
        return Err(AppError::invalid(
            "filename",
            format!("only {extension} files are allowed"),
        ));
    }
    let rel = Path::new(filename);
    let escapes = rel.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || rel.is_absolute() || filename.contains('\\') {
        return Err(AppError::PathTraversal {
            path: filename.to_string(),
        });
    }
    Ok(rel)
}

/// `real_base/rel`, checked against symlinks leading out of `real_base`.
fn confine(real_base: &Path, rel: &Path, filename: &str) -> Result<PathBuf, AppError> {
    let target = real_base.join(rel);
    let probe = if target.exists() {
        Some(target.clone())
    } else {
        target.parent().filter(|p| p.exists()).map(Path::to_path_buf)
    };
    if let Some(probe) = probe {
        let real = fs::canonicalize(&probe).map_err(|e| AppError::io(probe.display(), &e))?;
        if !real.starts_with(real_base) {
            return Err(AppError::PathTraversal {
                path: filename.to_string(),
            });
        }
        if target.exists() {
            return Ok(real);
        }
    }
    Ok(target)
}

/// Every regular file under `dir`, depth-first, sorted per directory.
pub fn files_recursively(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            files.extend(files_recursively(&path)?);
        } else {
            files.push(path);
        }
    }
    Ok(files)
}

/// Names of the `.json` files directly inside `<project>/data`, sorted.
/// Backups (`*.bak`) and temp files never match.
pub fn list_data_files(project: &Path) -> Result<Vec<String>, AppError> {
    let dir = paths::data_dir(project);
    let read = fs::read_dir(&dir).map_err(|e| AppError::io(dir.display(), &e))?;
    let mut names: Vec<String> = read
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.ends_with(".json"))
        .collect();
    names.sort();
    Ok(names)
}
