//! Database records: templates for new actors, items and skills, and the
//! read-only shapes search needs from common events and troops.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::mz::command::EventCommand;

/// Fields a caller may set on a new actor. Everything else takes editor defaults.
#[derive(Debug, Clone)]
pub struct ActorSpec {
    pub name: String,
    pub class_id: u32,
    pub initial_level: u32,
    pub max_level: u32,
}

#[derive(Debug, Clone)]
pub struct ItemSpec {
    pub name: String,
    pub price: u32,
    pub consumable: bool,
    pub scope: u32,
    pub occasion: u32,
}

#[derive(Debug, Clone)]
pub struct SkillSpec {
    pub name: String,
    pub mp_cost: u32,
    pub tp_cost: u32,
    pub scope: u32,
    pub occasion: u32,
}

pub fn actor_record(id: usize, spec: &ActorSpec) -> Value {
    json!({
        "id": id,
        "name": spec.name,
        "classId": spec.class_id,
        "level": spec.initial_level,
        "characterName": "",
        "characterIndex": 0,
        "faceName": "",
        "faceIndex": 0,
        "traits": [],
        "initialLevel": spec.initial_level,
        "maxLevel": spec.max_level,
        "nickname": "",
        "note": "",
        "profile": "",
    })
}

pub fn item_record(id: usize, spec: &ItemSpec) -> Value {
    json!({
        "id": id,
        "name": spec.name,
        "iconIndex": 0,
        "description": "",
        "price": spec.price,
        "consumable": spec.consumable,
        "scope": spec.scope,
        "occasion": spec.occasion,
        "speed": 0,
        "successRate": 100,
        "repeats": 1,
        "tpGain": 0,
        "hitType": 0,
        "animationId": 0,
        "damage": {"type": 0, "elementId": 0, "formula": "0", "variance": 20},
        "effects": [],
        "note": "",
    })
}

pub fn skill_record(id: usize, spec: &SkillSpec) -> Value {
    json!({
        "id": id,
        "name": spec.name,
        "iconIndex": 0,
        "description": "",
        "mpCost": spec.mp_cost,
        "tpCost": spec.tp_cost,
        "scope": spec.scope,
        "occasion": spec.occasion,
        "speed": 0,
        "successRate": 100,
        "repeats": 1,
        "tpGain": 0,
        "hitType": 1,
        "animationId": 0,
        "damage": {"type": 1, "elementId": 0, "formula": "0", "variance": 20},
        "effects": [],
        "note": "",
        "message1": "",
        "message2": "",
        "requiredWtypeId1": 0,
        "requiredWtypeId2": 0,
        "stypeId": 1,
    })
}

/// `CommonEvents.json` entry. A common event has a single list, searched as page 1.
#[derive(Debug, Clone, Deserialize)]
pub struct CommonEvent {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub list: Vec<EventCommand>,
}

/// `Troops.json` entry with its battle event pages.
#[derive(Debug, Clone, Deserialize)]
pub struct Troop {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pages: Vec<TroopPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TroopPage {
    #[serde(default)]
    pub list: Vec<EventCommand>,
}
