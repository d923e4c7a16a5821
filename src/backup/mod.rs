//! Snapshot-before-write transactions for project data files.
//!
//! Every mutating write runs inside [`with_backup`]: the current file is copied
//! to a sibling `<name>.<epoch-ms>.bak` first, and if the write fails the copy
//! is put back. Backups persist until [`prune_backups`] removes the oldest.

pub mod naming;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::Serialize;

use crate::error::AppError;
use crate::project::atomic_write;
use crate::util::{iso8601_from_ms, now_ms};

/// Default number of snapshots kept per file.
pub const DEFAULT_KEEP: usize = 5;

/// One snapshot of a data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    pub backup_name: String,
    pub timestamp_ms: u64,
    /// ISO-8601 UTC rendering of `timestamp_ms`.
    pub date: String,
    #[serde(skip)]
    pub path: PathBuf,
}

impl BackupEntry {
    fn new(dir: &Path, backup_name: String, timestamp_ms: u64) -> Self {
        Self {
            path: dir.join(&backup_name),
            date: iso8601_from_ms(timestamp_ms),
            backup_name,
            timestamp_ms,
        }
    }
}

fn split(path: &Path) -> Result<(PathBuf, String), AppError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::invalid("path", format!("{} has no file name", path.display())))?;
    let dir = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((dir, name.to_string()))
}

/// The timestamp after `taken`, or an error naming the backup that already
/// holds the largest representable one.
fn next_timestamp(taken: u64, taken_by: &str) -> Result<u64, AppError> {
    taken.checked_add(1).ok_or_else(|| AppError::Io {
        message: format!("backup {taken_by} has the largest possible timestamp; remove it to take new backups"),
    })
}

/// Copy `path` to a fresh backup sibling.
///
/// The timestamp is the current epoch ms, bumped forward while a backup with
/// that name already exists, so snapshots of one file are strictly ordered.
pub fn create_backup(path: &Path) -> Result<BackupEntry, AppError> {
    let (dir, name) = split(path)?;
    let bytes = fs::read(path).map_err(|e| AppError::io(path.display(), &e))?;

    let mut ts = now_ms();
    if let Some(newest) = list_backups(path)?.first() {
        ts = ts.max(next_timestamp(newest.timestamp_ms, &newest.backup_name)?);
    }
    loop {
        let entry = BackupEntry::new(&dir, naming::backup_name(&name, ts), ts);
        match OpenOptions::new().write(true).create_new(true).open(&entry.path) {
            Ok(mut file) => {
                file.write_all(&bytes)
                    .and_then(|()| file.sync_all())
                    .map_err(|e| AppError::io(entry.path.display(), &e))?;
                tracing::info!(file = %path.display(), backup = %entry.backup_name, "created backup");
                return Ok(entry);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                ts = next_timestamp(ts, &entry.backup_name)?;
            }
            Err(e) => return Err(AppError::io(entry.path.display(), &e)),
        }
    }
}

/// All backups of `path`, newest first. Names that do not match the backup
/// pattern exactly are ignored; a missing directory yields an empty list.
pub fn list_backups(path: &Path) -> Result<Vec<BackupEntry>, AppError> {
    let (dir, name) = split(path)?;
    let read = match fs::read_dir(&dir) {
        Ok(read) => read,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::io(dir.display(), &e)),
    };

    let mut entries: Vec<BackupEntry> = read
        .filter_map(Result::ok)
        .filter_map(|e| e.file_name().into_string().ok())
        .filter_map(|candidate| {
            naming::parse_backup_name(&name, &candidate)
                .map(|ts| BackupEntry::new(&dir, candidate, ts))
        })
        .collect();
    entries.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
    Ok(entries)
}

/// Overwrite `path` with its newest backup. The backup itself is kept.
pub fn restore_latest(path: &Path) -> Result<BackupEntry, AppError> {
    let latest = list_backups(path)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NoBackupFound {
            file: path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
        })?;
    let bytes = fs::read(&latest.path).map_err(|e| AppError::io(latest.path.display(), &e))?;
    atomic_write(path, &bytes)?;
    tracing::info!(file = %path.display(), backup = %latest.backup_name, "restored from backup");
    Ok(latest)
}

/// Delete all but the `keep` newest backups of `path`. Returns how many were
/// removed. Failures are logged and skipped.
pub fn prune_backups(path: &Path, keep: usize) -> usize {
    let entries = match list_backups(path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "failed to list backups for pruning");
            return 0;
        }
    };
    let mut removed = 0;
    for old in entries.iter().skip(keep) {
        match fs::remove_file(&old.path) {
            Ok(()) => {
                removed += 1;
                tracing::debug!(backup = %old.backup_name, "removed old backup");
            }
            Err(e) => {
                tracing::warn!(backup = %old.backup_name, error = %e, "failed to remove old backup");
            }
        }
    }
    removed
}

/// Run `op` against `path` with snapshot and rollback.
///
/// If `path` exists it is backed up first. When `op` fails the snapshot is
/// restored and `op`'s error returned; if the restore fails too the result is
/// [`AppError::RollbackFailed`] carrying both. When `path` did not exist there
/// is nothing to roll back to.
pub fn with_backup<T>(
    path: &Path,
    op: impl FnOnce() -> Result<T, AppError>,
) -> Result<T, AppError> {
    let snapshot = if path.exists() {
        Some(create_backup(path)?)
    } else {
        None
    };

    match op() {
        Ok(value) => Ok(value),
        Err(cause) => {
            let Some(snapshot) = snapshot else {
                return Err(cause);
            };
            let restore = fs::read(&snapshot.path)
                .map_err(|e| AppError::io(snapshot.path.display(), &e))
                .and_then(|bytes| atomic_write(path, &bytes));
            match restore {
                Ok(()) => {
                    tracing::info!(file = %path.display(), backup = %snapshot.backup_name, "rolled back after failed write");
                    Err(cause)
                }
                Err(rollback) => {
                    tracing::error!(file = %path.display(), error = %rollback, "rollback failed");
                    Err(AppError::RollbackFailed {
                        cause: Box::new(cause),
                        rollback: rollback.to_string(),
                    })
                }
            }
        }
    }
}
