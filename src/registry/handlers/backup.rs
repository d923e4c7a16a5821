#![allow(clippy::needless_pass_by_value)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

use crate::backup::{self, BackupEntry};
use crate::error::AppError;
use crate::project;
use crate::registry::params::{BackupFileParams, PruneBackupsParams};
use crate::registry::{pretty, CommandOutput, CommandResult};
use crate::state::AppState;
use crate::store::ProjectStore;

#[derive(Debug, Clone, Serialize)]
pub struct FileBackups {
    pub file: String,
    /// Newest first.
    pub backups: Vec<BackupEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoredBackup {
    pub file: String,
    pub backup: BackupEntry,
}

/// The named data file, or every `.json` file in `data/`.
fn targets(store: &ProjectStore, filename: Option<&str>) -> Result<Vec<(String, PathBuf)>, AppError> {
    match filename {
        Some(name) => Ok(vec![(name.to_string(), store.data_path(name)?)]),
        None => project::list_data_files(store.root())?
            .into_iter()
            .map(|name| store.data_path(&name).map(|path| (name, path)))
            .collect(),
    }
}

fn most_recently_modified(store: &ProjectStore) -> Result<(String, PathBuf), AppError> {
    let mut newest: Option<(SystemTime, String, PathBuf)> = None;
    for (name, path) in targets(store, None)? {
        let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) else {
            continue;
        };
        if newest.as_ref().is_none_or(|(t, _, _)| modified > *t) {
            newest = Some((modified, name, path));
        }
    }
    newest
        .map(|(_, name, path)| (name, path))
        .ok_or_else(|| AppError::invalid("filename", "no .json files found in the data directory"))
}

pub fn list_backups(state: &Arc<AppState>, p: BackupFileParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let mut listing = Vec::new();
    for (file, path) in targets(&store, p.filename.as_deref())? {
        let backups = backup::list_backups(&path)?;
        if p.filename.is_some() || !backups.is_empty() {
            listing.push(FileBackups { file, backups });
        }
    }
    let message = if listing.iter().all(|f| f.backups.is_empty()) {
        "No backups found.".to_string()
    } else {
        pretty(&listing)
    };
    Ok(CommandOutput::new(message, CommandResult::ListBackups(listing)))
}

/// Overwrites the file with its newest backup. The current content is not
/// snapshotted first, so repeated undos keep restoring the same backup.
pub fn undo_last_change(state: &Arc<AppState>, p: BackupFileParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let (file, path) = match p.filename.as_deref() {
        Some(name) => (name.to_string(), store.data_path(name)?),
        None => most_recently_modified(&store)?,
    };
    let backup = backup::restore_latest(&path)?;
    Ok(CommandOutput::new(
        format!("Successfully restored {file} from backup."),
        CommandResult::UndoLastChange(RestoredBackup { file, backup }),
    ))
}

pub fn prune_backups(state: &Arc<AppState>, p: PruneBackupsParams) -> Result<CommandOutput, AppError> {
    let keep = p.keep.unwrap_or(state.settings.backup_keep);
    let store = state.store(&p.project_path)?;
    let removed: usize = targets(&store, p.filename.as_deref())?
        .iter()
        .map(|(_, path)| backup::prune_backups(path, keep))
        .sum();
    Ok(CommandOutput::new(
        format!("Removed {removed} backup(s), keeping the newest {keep} per file."),
        CommandResult::PruneBackups(removed),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::settings::Settings;
    use crate::store::tests::fixture_project;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Settings::default(), std::env::temp_dir()))
    }

    fn params(dir: &tempfile::TempDir, filename: Option<&str>) -> BackupFileParams {
        BackupFileParams {
            project_path: dir.path().into(),
            filename: filename.map(str::to_string),
        }
    }

    #[test]
    fn undo_restores_previous_content() {
        let dir = fixture_project();
        let store = ProjectStore::open(dir.path()).unwrap();
        let before = fs::read_to_string(store.map_path(1)).unwrap();
        let mut map = store.load_map(1).unwrap();
        map.data[0] = 7;
        store.save_map(1, &map).unwrap();
        assert_ne!(fs::read_to_string(store.map_path(1)).unwrap(), before);

        let out = undo_last_change(&state(), params(&dir, Some("Map001.json"))).unwrap();
        assert_eq!(out.message, "Successfully restored Map001.json from backup.");
        assert_eq!(fs::read_to_string(store.map_path(1)).unwrap(), before);
    }

    #[test]
    fn undo_without_backup_fails() {
        let dir = fixture_project();
        let err = undo_last_change(&state(), params(&dir, Some("MapInfos.json"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.code(), "E1600");
    }

    #[test]
    fn listing_covers_only_files_with_backups() {
        let dir = fixture_project();
        let out = list_backups(&state(), params(&dir, None)).unwrap();
        assert_eq!(out.message, "No backups found.");

        let store = ProjectStore::open(dir.path()).unwrap();
        let map = store.load_map(1).unwrap();
        store.save_map(1, &map).unwrap();
        let out = list_backups(&state(), params(&dir, None)).unwrap();
        let CommandResult::ListBackups(listing) = out.result else {
            unreachable!()
        };
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].file, "Map001.json");
        assert_eq!(listing[0].backups.len(), 1);
    }

    #[test]
    fn prune_defaults_to_configured_keep() {
        let dir = fixture_project();
        let store = ProjectStore::open(dir.path()).unwrap().with_backup_keep(usize::MAX);
        let map = store.load_map(1).unwrap();
        for _ in 0..4 {
            store.save_map(1, &map).unwrap();
        }
        let settings = Settings {
            backup_keep: 1,
            ..Settings::default()
        };
        let state = Arc::new(AppState::new(settings, std::env::temp_dir()));
        let out = prune_backups(
            &state,
            PruneBackupsParams {
                project_path: dir.path().into(),
                filename: None,
                keep: None,
            },
        )
        .unwrap();
        assert!(matches!(out.result, CommandResult::PruneBackups(3)));
        assert_eq!(backup::list_backups(&store.map_path(1)).unwrap().len(), 1);
    }
}
