use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::mz::command::EventCommand;
use crate::mz::fields::{document, Rest};

/// Tile layers per map (4 tile layers, shadow, region).
pub const LAYERS: u32 = 6;
pub const MAX_LAYER: u32 = LAYERS - 1;

pub const DEFAULT_WIDTH: u32 = 17;
pub const DEFAULT_HEIGHT: u32 = 13;
pub const DEFAULT_TILESET: u32 = 1;

/// One `MapNNN.json` document.
#[derive(Debug, Clone)]
pub struct MapData {
    pub width: u32,
    pub height: u32,
    /// `layers * height * width` tile ids.
    pub data: Vec<i64>,
    pub events: EventTable,
    rest: Rest,
}

document!(MapData {
    width => "width",
    height => "height",
    data => "data",
    events => "events",
});

/// A map-scoped scripted entity.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: u32,
    pub name: String,
    pub pages: Vec<EventPage>,
    rest: Rest,
}

document!(Event {
    id => "id",
    name => "name",
    pages => "pages",
});

/// One conditional variant of an event. Conditions and image/move metadata
/// stay opaque.
#[derive(Debug, Clone)]
pub struct EventPage {
    pub list: Vec<EventCommand>,
    rest: Rest,
}

document!(EventPage { list => "list" });

impl Event {
    /// `name`, or `Event <id>` when the name is blank.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("Event {}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// The `events` field. The MZ editor writes an array indexed by event id with
/// `null` holes; some tools write an object keyed by the stringified id. The
/// shape read is the shape written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTable {
    List(Vec<Option<Event>>),
    Keyed(IndexMap<String, Option<Event>>),
}

impl Default for EventTable {
    fn default() -> Self {
        EventTable::List(vec![None])
    }
}

impl EventTable {
    pub fn get(&self, id: u32) -> Option<&Event> {
        match self {
            EventTable::List(list) => list
                .get(usize::try_from(id).ok()?)
                .and_then(Option::as_ref)
                .or_else(|| list.iter().flatten().find(|e| e.id == id)),
            EventTable::Keyed(map) => map.get(&id.to_string()).and_then(Option::as_ref),
        }
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Event> {
        match self {
            EventTable::List(list) => {
                let slot = usize::try_from(id).ok()?;
                // Prefer the slot, fall back to a scan for arrays with gaps.
                if list.get(slot).is_some_and(Option::is_some) {
                    list.get_mut(slot).and_then(Option::as_mut)
                } else {
                    list.iter_mut().flatten().find(|e| e.id == id)
                }
            }
            EventTable::Keyed(map) => map.get_mut(&id.to_string()).and_then(Option::as_mut),
        }
    }

    /// Present events in file order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Event> + '_> {
        match self {
            EventTable::List(list) => Box::new(list.iter().flatten()),
            EventTable::Keyed(map) => Box::new(map.values().flatten()),
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl MapData {
    /// A new empty map with the editor's default properties.
    pub fn blank(display_name: &str, width: u32, height: u32, tileset_id: u32) -> Self {
        let template = json!({
            "autoplayBgm": false,
            "autoplayBgs": false,
            "battleback1Name": "",
            "battleback2Name": "",
            "bgm": {"name": "", "pan": 0, "pitch": 100, "volume": 90},
            "bgs": {"name": "", "pan": 0, "pitch": 100, "volume": 90},
            "disableDashing": false,
            "displayName": display_name,
            "encounterList": [],
            "encounterStep": 30,
            "height": null,
            "width": null,
            "note": "",
            "parallaxLoopX": false,
            "parallaxLoopY": false,
            "parallaxName": "",
            "parallaxShow": true,
            "parallaxSx": 0,
            "parallaxSy": 0,
            "scrollType": 0,
            "specifyBattleback": false,
            "tilesetId": tileset_id,
            "data": null,
            "events": null,
        });
        let rest = match template {
            Value::Object(map) => map,
            _ => Rest::new(),
        };
        let cells = u64::from(width) * u64::from(height) * u64::from(LAYERS);
        Self {
            width,
            height,
            data: vec![0; usize::try_from(cells).unwrap_or(0)],
            events: EventTable::default(),
            rest,
        }
    }

    /// Index into `data` for a tile, `(layer * height + y) * width + x`.
    /// `None` when the coordinates or layer fall outside the map.
    pub fn tile_index(&self, x: u32, y: u32, layer: u32) -> Option<usize> {
        if x >= self.width || y >= self.height || layer > MAX_LAYER {
            return None;
        }
        let index = (u64::from(layer) * u64::from(self.height) + u64::from(y))
            * u64::from(self.width)
            + u64::from(x);
        let index = usize::try_from(index).ok()?;
        (index < self.data.len()).then_some(index)
    }

    /// Opaque field access, e.g. `displayName`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.rest.get(key)
    }
}

/// One entry of `MapInfos.json`. Read-only view.
#[derive(Debug, Clone, Deserialize)]
pub struct MapInfo {
    pub id: u32,
    #[serde(default)]
    pub name: String,
}
