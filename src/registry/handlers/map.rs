#![allow(clippy::needless_pass_by_value)]

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::AppError;
use crate::mz::map::MAX_LAYER;
use crate::mz::MapData;
use crate::paths;
use crate::registry::params::{CreateMapParams, DrawMapTileParams};
use crate::registry::{CommandOutput, CommandResult};
use crate::state::AppState;

pub fn draw_map_tile(state: &Arc<AppState>, p: DrawMapTileParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let mut map = store.load_map(p.map_id)?;

    let (width, height) = (i64::from(map.width), i64::from(map.height));
    if !(0..width).contains(&p.x) || !(0..height).contains(&p.y) {
        return Err(AppError::invalid(
            "coordinates",
            format!("Coordinates ({},{}) out of bounds (W:{width}, H:{height})", p.x, p.y),
        ));
    }
    if !(0..=i64::from(MAX_LAYER)).contains(&p.layer) {
        return Err(AppError::invalid(
            "layer",
            format!("Layer {} out of bounds (0-{MAX_LAYER})", p.layer),
        ));
    }

    let index = u32::try_from(p.x)
        .ok()
        .zip(u32::try_from(p.y).ok())
        .zip(u32::try_from(p.layer).ok())
        .and_then(|((x, y), layer)| map.tile_index(x, y, layer));
    let len = map.data.len();
    let slot = index
        .and_then(|i| map.data.get_mut(i))
        .ok_or_else(|| AppError::IndexOutOfBounds {
            what: "Tile".into(),
            index: (p.layer * height + p.y) * width + p.x,
            len,
        })?;
    *slot = p.tile_id;

    store.save_map(p.map_id, &map)?;
    Ok(CommandOutput::new(
        format!(
            "Successfully drew tile {} at ({},{}) on layer {}.",
            p.tile_id, p.x, p.y, p.layer
        ),
        CommandResult::DrawMapTile,
    ))
}

/// Writes `MapNNN.json`, then appends the `MapInfos.json` entry. If the
/// second write fails the new map file is removed again.
pub fn create_map(state: &Arc<AppState>, p: CreateMapParams) -> Result<CommandOutput, AppError> {
    if p.width == 0 || p.height == 0 {
        return Err(AppError::invalid("width", "map dimensions must be at least 1x1"));
    }
    if p.map_name.trim().is_empty() {
        return Err(AppError::invalid("mapName", "map name must not be empty"));
    }
    let store = state.store(&p.project_path)?;

    let mut infos = store
        .read_data_opt::<Vec<Value>>(paths::MAP_INFOS_FILE)?
        .unwrap_or_else(|| vec![Value::Null]);
    let map_id = u32::try_from(infos.len())
        .map_err(|_| AppError::invalid("mapId", "too many maps"))?;
    let map_path = store.map_path(map_id);
    if map_path.exists() {
        return Err(AppError::invalid(
            "mapId",
            format!(
                "{} already exists but is not registered in {}",
                paths::map_file_name(map_id),
                paths::MAP_INFOS_FILE
            ),
        ));
    }

    let map = MapData::blank(&p.map_name, p.width, p.height, p.tileset_id);
    store.save_map(map_id, &map)?;

    infos.push(json!({
        "id": map_id,
        "expanded": false,
        "name": p.map_name,
        "order": map_id,
        "parentId": 0,
        "scrollX": 0,
        "scrollY": 0,
    }));
    if let Err(e) = store.write_data_value(paths::MAP_INFOS_FILE, &infos) {
        if let Err(cleanup) = std::fs::remove_file(&map_path) {
            tracing::warn!(file = %map_path.display(), error = %cleanup, "failed to remove unregistered map");
        }
        return Err(e);
    }

    Ok(CommandOutput::new(
        format!(
            "Successfully created map \"{}\" (ID: {map_id}, {}x{}).",
            p.map_name, p.width, p.height
        ),
        CommandResult::CreateMap(map_id),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::settings::Settings;
    use crate::store::tests::fixture_project;
    use crate::store::ProjectStore;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Settings::default(), std::env::temp_dir()))
    }

    fn tile(dir: &tempfile::TempDir, x: i64, y: i64, layer: i64) -> DrawMapTileParams {
        DrawMapTileParams {
            project_path: dir.path().into(),
            map_id: 1,
            x,
            y,
            layer,
            tile_id: 2816,
        }
    }

    #[test]
    fn draws_at_layered_index() {
        let dir = fixture_project();
        let out = draw_map_tile(&state(), tile(&dir, 2, 1, 1)).unwrap();
        assert_eq!(out.message, "Successfully drew tile 2816 at (2,1) on layer 1.");
        let map = ProjectStore::open(dir.path()).unwrap().load_map(1).unwrap();
        // (1 * 2 + 1) * 3 + 2
        assert_eq!(map.data[11], 2816);
        assert_eq!(map.data.iter().filter(|&&t| t != 0).count(), 1);
    }

    #[test]
    fn rejects_out_of_range_tiles() {
        let dir = fixture_project();
        let err = draw_map_tile(&state(), tile(&dir, 3, 0, 0)).unwrap_err();
        assert!(err.to_string().contains("Coordinates (3,0) out of bounds (W:3, H:2)"));
        let err = draw_map_tile(&state(), tile(&dir, 0, 0, 6)).unwrap_err();
        assert!(err.to_string().contains("Layer 6 out of bounds (0-5)"));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn create_map_registers_next_id() {
        let dir = fixture_project();
        let out = create_map(
            &state(),
            CreateMapParams {
                project_path: dir.path().into(),
                map_name: "Cave".into(),
                width: 4,
                height: 3,
                tileset_id: 2,
            },
        )
        .unwrap();
        assert!(matches!(out.result, CommandResult::CreateMap(2)));
        assert_eq!(out.message, "Successfully created map \"Cave\" (ID: 2, 4x3).");

        let store = ProjectStore::open(dir.path()).unwrap();
        let map = store.load_map(2).unwrap();
        assert_eq!(map.data.len(), 4 * 3 * 6);
        assert_eq!(map.field("displayName"), Some(&json!("Cave")));
        let infos = store.read_data_value(paths::MAP_INFOS_FILE).unwrap();
        assert_eq!(infos[2]["name"], "Cave");
        assert_eq!(infos[2]["order"], 2);
    }

    #[test]
    fn create_map_refuses_to_overwrite() {
        let dir = fixture_project();
        std::fs::write(dir.path().join("data/Map002.json"), "{}").unwrap();
        let err = create_map(
            &state(),
            CreateMapParams {
                project_path: dir.path().into(),
                map_name: "Cave".into(),
                width: 4,
                height: 3,
                tileset_id: 1,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(std::fs::read_to_string(dir.path().join("data/Map002.json")).unwrap(), "{}");
    }
}
