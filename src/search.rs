//! Project-wide search over every event command list.
//!
//! Sources, in order: common events, every map listed in `MapInfos.json`
//! (or every `MapNNN.json` when there is no `MapInfos.json`), then troop
//! battle events. A missing or unreadable source contributes nothing.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;
use crate::mz::database::{CommonEvent, Troop};
use crate::mz::map::MapInfo;
use crate::mz::EventCommand;
use crate::paths;
use crate::project;
use crate::store::ProjectStore;

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    /// `CommonEvents`, `Map 3: Town` or `Troop 2: Slime*2`.
    pub source: String,
    pub event_name: String,
    pub event_id: u32,
    /// 1-based.
    pub page_number: usize,
    /// 1-based.
    pub line_number: usize,
    pub code: u32,
    pub parameters: Vec<Value>,
}

/// True when `query` is the opcode, or occurs in the compact JSON of the
/// parameter list.
pub fn matches(cmd: &EventCommand, query: &str) -> bool {
    if cmd.code.to_string() == query {
        return true;
    }
    serde_json::to_string(&cmd.parameters).is_ok_and(|json| json.contains(query))
}

struct Collector<'q> {
    query: &'q str,
    found: Vec<SearchMatch>,
}

impl Collector<'_> {
    fn scan(&mut self, source: &str, event_name: &str, event_id: u32, page_index: usize, list: &[EventCommand]) {
        for (i, cmd) in list.iter().enumerate() {
            if matches(cmd, self.query) {
                self.found.push(SearchMatch {
                    source: source.to_string(),
                    event_name: event_name.to_string(),
                    event_id,
                    page_number: page_index + 1,
                    line_number: i + 1,
                    code: cmd.code,
                    parameters: cmd.parameters.clone(),
                });
            }
        }
    }
}

/// Read an optional source; failures are logged at debug level and skipped.
fn optional<T>(what: &str, result: Result<T, AppError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(source = what, error = %e, "search source skipped");
            None
        }
    }
}

/// Map ids and display labels to search, from `MapInfos.json` or a directory scan.
fn map_sources(store: &ProjectStore) -> Vec<(u32, String)> {
    if let Some(infos) = optional(
        paths::MAP_INFOS_FILE,
        store.read_data::<Vec<Option<MapInfo>>>(paths::MAP_INFOS_FILE),
    ) {
        return infos
            .into_iter()
            .flatten()
            .map(|info| (info.id, format!("Map {}: {}", info.id, info.name)))
            .collect();
    }

    let mut ids: Vec<u32> = optional("data dir", project::list_data_files(store.root()))
        .unwrap_or_default()
        .iter()
        .filter_map(|name| paths::parse_map_file_name(name))
        .collect();
    ids.sort_unstable();
    ids.into_iter().map(|id| (id, format!("Map {id}"))).collect()
}

pub fn search_events(store: &ProjectStore, query: &str) -> Result<Vec<SearchMatch>, AppError> {
    if query.is_empty() {
        return Err(AppError::invalid("query", "search query must not be empty"));
    }
    let mut c = Collector {
        query,
        found: Vec::new(),
    };

    if let Some(common) = optional(
        paths::COMMON_EVENTS_FILE,
        store.read_data::<Vec<Option<CommonEvent>>>(paths::COMMON_EVENTS_FILE),
    ) {
        for ev in common.iter().flatten() {
            let name = if ev.name.is_empty() {
                format!("Event {}", ev.id)
            } else {
                ev.name.clone()
            };
            c.scan("CommonEvents", &name, ev.id, 0, &ev.list);
        }
    }

    for (map_id, label) in map_sources(store) {
        let Some(map) = optional(&paths::map_file_name(map_id), store.load_map(map_id)) else {
            continue;
        };
        for event in map.events.iter() {
            let name = event.display_name();
            for (page_index, page) in event.pages.iter().enumerate() {
                c.scan(&label, &name, event.id, page_index, &page.list);
            }
        }
    }

    if let Some(troops) = optional(
        paths::TROOPS_FILE,
        store.read_data::<Vec<Option<Troop>>>(paths::TROOPS_FILE),
    ) {
        for troop in troops.iter().flatten() {
            let label = format!("Troop {}: {}", troop.id, troop.name);
            for (page_index, page) in troop.pages.iter().enumerate() {
                c.scan(&label, &troop.name, troop.id, page_index, &page.list);
            }
        }
    }

    tracing::debug!(query, matches = c.found.len(), "search finished");
    Ok(c.found)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::store::tests::fixture_project;
    use serde_json::json;
    use std::fs;

    fn write(dir: &std::path::Path, name: &str, value: &Value) {
        fs::write(dir.join("data").join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
    }

    #[test]
    fn finds_text_in_map_pages() {
        let dir = fixture_project();
        let store = ProjectStore::open(dir.path()).unwrap();
        let found = search_events(&store, "Halt").unwrap();
        assert_eq!(found.len(), 1);
        let m = &found[0];
        assert_eq!(m.source, "Map 1: Town");
        assert_eq!(m.event_name, "Guard");
        assert_eq!(m.event_id, 1);
        assert_eq!(m.page_number, 2);
        assert_eq!(m.line_number, 2);
        assert_eq!(m.code, 401);
    }

    #[test]
    fn finds_by_opcode() {
        let dir = fixture_project();
        let store = ProjectStore::open(dir.path()).unwrap();
        let found = search_events(&store, "101").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, 101);
    }

    #[test]
    fn searches_common_events_and_troops() {
        let dir = fixture_project();
        write(
            dir.path(),
            paths::COMMON_EVENTS_FILE,
            &json!([null, {"id": 1, "name": "", "trigger": 0, "list": [
                {"code": 355, "indent": 0, "parameters": ["$gameParty.gainGold(10)"]},
                {"code": 0, "indent": 0, "parameters": []}
            ]}]),
        );
        write(
            dir.path(),
            paths::TROOPS_FILE,
            &json!([null, {"id": 4, "name": "Bats", "pages": [
                {"conditions": {}, "list": [
                    {"code": 401, "indent": 0, "parameters": ["gainGold is not here"]},
                    {"code": 0, "indent": 0, "parameters": []}
                ]}
            ]}]),
        );
        let store = ProjectStore::open(dir.path()).unwrap();
        let found = search_events(&store, "gainGold").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].source, "CommonEvents");
        assert_eq!(found[0].event_name, "Event 1");
        assert_eq!(found[0].page_number, 1);
        assert_eq!(found[1].source, "Troop 4: Bats");
    }

    #[test]
    fn corrupt_sources_are_skipped() {
        let dir = fixture_project();
        fs::write(dir.path().join("data").join(paths::COMMON_EVENTS_FILE), "[{").unwrap();
        let store = ProjectStore::open(dir.path()).unwrap();
        assert_eq!(search_events(&store, "Halt").unwrap().len(), 1);
    }

    #[test]
    fn falls_back_to_scanning_maps() {
        let dir = fixture_project();
        fs::remove_file(dir.path().join("data").join(paths::MAP_INFOS_FILE)).unwrap();
        let store = ProjectStore::open(dir.path()).unwrap();
        let found = search_events(&store, "Halt").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].source, "Map 1");
    }

    #[test]
    fn empty_query_is_invalid() {
        let dir = fixture_project();
        let store = ProjectStore::open(dir.path()).unwrap();
        assert!(matches!(
            search_events(&store, ""),
            Err(AppError::InvalidInput { .. })
        ));
    }
}
