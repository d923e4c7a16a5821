#![allow(clippy::needless_pass_by_value)]

use std::fs;
use std::path::{Component, Path};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::paths;
use crate::project;
use crate::registry::params::{
    AssetType, DataFileParams, ListAssetsParams, ProjectParams, WriteDataFileParams,
};
use crate::registry::{pretty, CommandOutput, CommandResult};
use crate::state::AppState;

/// The few `System.json` fields a caller needs to recognise a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub game_title: Value,
    pub version_id: Value,
    pub locale: Value,
    pub currency_unit: Value,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetListing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegrityIssue {
    #[serde(rename_all = "camelCase")]
    MissingImage {
        file: String,
        item_id: Value,
        item_name: String,
        image_name: String,
        expected_path: String,
    },
    #[serde(rename_all = "camelCase")]
    OrphanedMap { file: String, map_id: u32 },
}

pub fn get_project_info(state: &Arc<AppState>, p: ProjectParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let system = store.read_data_value(paths::SYSTEM_FILE)?;
    let field = |key: &str| system.get(key).cloned().unwrap_or(Value::Null);
    let info = ProjectInfo {
        game_title: field("gameTitle"),
        version_id: field("versionId"),
        locale: field("locale"),
        currency_unit: field("currencyUnit"),
    };
    Ok(CommandOutput::new(pretty(&info), CommandResult::GetProjectInfo(info)))
}

pub fn list_data_files(state: &Arc<AppState>, p: ProjectParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let files = project::list_data_files(store.root())?;
    Ok(CommandOutput::new(pretty(&files), CommandResult::ListDataFiles(files)))
}

/// The message carries the file text as stored; the result carries it parsed.
pub fn read_data_file(state: &Arc<AppState>, p: DataFileParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let path = store.data_path(&p.filename)?;
    let content = fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::DataFileNotFound {
                filename: p.filename.clone(),
            }
        } else {
            AppError::io(path.display(), &e)
        }
    })?;
    let value: Value =
        serde_json::from_str(&content).map_err(|e| AppError::DataFileCorrupt {
            filename: p.filename.clone(),
            reason: e.to_string(),
        })?;
    Ok(CommandOutput::new(content, CommandResult::ReadDataFile(value)))
}

pub fn write_data_file(state: &Arc<AppState>, p: WriteDataFileParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    store.write_data_raw(&p.filename, &p.content)?;
    Ok(CommandOutput::new(
        format!("Successfully wrote to {}", p.filename),
        CommandResult::WriteDataFile,
    ))
}

/// Project-relative, `/`-separated paths of every file under `<root>/<dir>`.
/// A missing directory lists as empty.
fn relative_files(root: &Path, dir: &str) -> Result<Vec<String>, AppError> {
    let base = root.join(dir);
    let files = match project::files_recursively(&base) {
        Ok(files) => files,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::io(base.display(), &e)),
    };
    Ok(files
        .iter()
        .filter_map(|f| f.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect())
}

pub fn list_assets(state: &Arc<AppState>, p: ListAssetsParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let mut listing = AssetListing::default();
    if matches!(p.asset_type, AssetType::Img | AssetType::All) {
        listing.img = Some(relative_files(store.root(), paths::IMG_DIR)?);
    }
    if matches!(p.asset_type, AssetType::Audio | AssetType::All) {
        listing.audio = Some(relative_files(store.root(), paths::AUDIO_DIR)?);
    }
    Ok(CommandOutput::new(pretty(&listing), CommandResult::ListAssets(listing)))
}

fn missing_character_images(root: &Path, actors: &[Value]) -> Vec<IntegrityIssue> {
    actors
        .iter()
        .filter(|a| a.is_object())
        .filter_map(|actor| {
            let image = actor.get("characterName")?.as_str().filter(|s| !s.is_empty())?;
            let expected = format!("{}/characters/{image}.png", paths::IMG_DIR);
            if root.join(&expected).is_file() {
                return None;
            }
            Some(IntegrityIssue::MissingImage {
                file: paths::ACTORS_FILE.to_string(),
                item_id: actor.get("id").cloned().unwrap_or(Value::Null),
                item_name: actor
                    .get("name")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("Unknown")
                    .to_string(),
                image_name: image.to_string(),
                expected_path: expected,
            })
        })
        .collect()
}

/// Read-only. Unreadable sources are skipped rather than reported.
pub fn check_assets_integrity(state: &Arc<AppState>, p: ProjectParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let mut issues = Vec::new();

    match store.read_data_opt::<Vec<Value>>(paths::ACTORS_FILE) {
        Ok(Some(actors)) => issues.extend(missing_character_images(store.root(), &actors)),
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "skipping actor image check"),
    }

    match store.read_data_opt::<Vec<Value>>(paths::MAP_INFOS_FILE) {
        Ok(Some(infos)) => {
            for file in project::list_data_files(store.root())? {
                let Some(map_id) = paths::parse_map_file_name(&file) else {
                    continue;
                };
                let registered = usize::try_from(map_id)
                    .ok()
                    .and_then(|i| infos.get(i))
                    .is_some_and(|info| !info.is_null());
                if !registered {
                    issues.push(IntegrityIssue::OrphanedMap { file, map_id });
                }
            }
        }
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "skipping orphaned map check"),
    }

    let message = if issues.is_empty() {
        "No asset integrity issues found.".to_string()
    } else {
        format!("Found {} issue(s):\n{}", issues.len(), pretty(&issues))
    };
    Ok(CommandOutput::new(message, CommandResult::CheckAssetsIntegrity(issues)))
}
