use std::path::PathBuf;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::mutator::{self, Choices, Condition, Dialogue, Picture};
use crate::mz::plugins::PluginEntry;
use crate::util::id_from_number_or_string;

fn before_terminator() -> i64 {
    mutator::BEFORE_TERMINATOR
}

fn default_true() -> bool {
    true
}

// ── Shared params ───────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectParams {
    /// Absolute path to the RPG Maker MZ project folder.
    pub project_path: PathBuf,
}

/// Addresses one event page: `projectPath`, `mapId`, `eventId`, `pageIndex`.
/// Ids may be sent as numbers or numeric strings.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub project_path: PathBuf,
    #[serde(deserialize_with = "id_from_number_or_string")]
    #[schemars(with = "u32")]
    pub map_id: u32,
    #[serde(deserialize_with = "id_from_number_or_string")]
    #[schemars(with = "u32")]
    pub event_id: u32,
    /// 0-based page index.
    pub page_index: usize,
}

/// Where a new group goes and at which indent its header sits.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertAt {
    /// Literal index in `[0, len]`, or -1 for just before the final end command.
    #[serde(default = "before_terminator")]
    pub insert_position: i64,
    #[serde(default)]
    pub indent: u32,
}

// ── Project params ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataFileParams {
    pub project_path: PathBuf,
    /// Name of a JSON file in `data/`, e.g. `Actors.json`.
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteDataFileParams {
    pub project_path: PathBuf,
    pub filename: String,
    /// Complete file content. Must parse as JSON.
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Img,
    Audio,
    #[default]
    All,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListAssetsParams {
    pub project_path: PathBuf,
    #[serde(default)]
    pub asset_type: AssetType,
}

// ── Event params ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InsertPageParams {
    #[serde(flatten)]
    pub page: PageParams,
    #[serde(flatten)]
    pub at: InsertAt,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddDialogueParams {
    #[serde(flatten)]
    pub page: PageParams,
    #[serde(flatten)]
    pub at: InsertAt,
    #[serde(flatten)]
    pub dialogue: Dialogue,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddChoiceParams {
    #[serde(flatten)]
    pub page: PageParams,
    #[serde(flatten)]
    pub at: InsertAt,
    #[serde(flatten)]
    pub choices: Choices,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddConditionalBranchParams {
    #[serde(flatten)]
    pub page: PageParams,
    #[serde(flatten)]
    pub at: InsertAt,
    pub condition: Condition,
    /// Emit an `Else` between the branch and its end. Defaults to true.
    #[serde(default = "default_true")]
    pub include_else: bool,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ShowPictureParams {
    #[serde(flatten)]
    pub page: PageParams,
    #[serde(flatten)]
    pub at: InsertAt,
    #[serde(flatten)]
    pub picture: Picture,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertEventCommandParams {
    #[serde(flatten)]
    pub page: PageParams,
    #[serde(default = "before_terminator")]
    pub insert_position: i64,
    /// `{code, indent, parameters}`; not checked against the catalog.
    pub new_command: Value,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEventCommandParams {
    #[serde(flatten)]
    pub page: PageParams,
    pub command_index: i64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventCommandParams {
    #[serde(flatten)]
    pub page: PageParams,
    pub command_index: i64,
    pub new_command: Value,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchEventsParams {
    pub project_path: PathBuf,
    /// Text to find in command parameters, or an exact command code.
    pub query: String,
}

// ── Map params ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrawMapTileParams {
    pub project_path: PathBuf,
    #[serde(deserialize_with = "id_from_number_or_string")]
    #[schemars(with = "u32")]
    pub map_id: u32,
    pub x: i64,
    pub y: i64,
    /// 0-3 tiles, 4 shadow, 5 region.
    pub layer: i64,
    pub tile_id: i64,
}

fn default_map_width() -> u32 {
    crate::mz::map::DEFAULT_WIDTH
}

fn default_map_height() -> u32 {
    crate::mz::map::DEFAULT_HEIGHT
}

fn default_tileset() -> u32 {
    crate::mz::map::DEFAULT_TILESET
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMapParams {
    pub project_path: PathBuf,
    pub map_name: String,
    #[serde(default = "default_map_width")]
    pub width: u32,
    #[serde(default = "default_map_height")]
    pub height: u32,
    #[serde(default = "default_tileset")]
    pub tileset_id: u32,
}

// ── Database params ─────────────────────────────────────────────

fn one() -> u32 {
    1
}

fn default_max_level() -> u32 {
    99
}

fn default_item_scope() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddActorParams {
    pub project_path: PathBuf,
    pub name: String,
    #[serde(default = "one")]
    pub class_id: u32,
    #[serde(default = "one")]
    pub initial_level: u32,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemParams {
    pub project_path: PathBuf,
    pub name: String,
    #[serde(default)]
    pub price: u32,
    #[serde(default = "default_true")]
    pub consumable: bool,
    #[serde(default = "default_item_scope")]
    pub scope: u32,
    #[serde(default)]
    pub occasion: u32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddSkillParams {
    pub project_path: PathBuf,
    pub name: String,
    #[serde(default)]
    pub mp_cost: u32,
    #[serde(default)]
    pub tp_cost: u32,
    #[serde(default = "one")]
    pub scope: u32,
    #[serde(default = "one")]
    pub occasion: u32,
}

// ── Plugin params ───────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WritePluginCodeParams {
    pub project_path: PathBuf,
    /// File name inside `js/plugins`, e.g. `MyPlugin.js`.
    pub filename: String,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePluginsConfigParams {
    pub project_path: PathBuf,
    /// The complete new list, in load order.
    pub plugins: Vec<PluginEntry>,
}

// ── Backup params ───────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupFileParams {
    pub project_path: PathBuf,
    /// A data file such as `Map001.json`. Omit to act on every data file
    /// (`undo_last_change`: the most recently modified one).
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PruneBackupsParams {
    pub project_path: PathBuf,
    #[serde(default)]
    pub filename: Option<String>,
    /// Backups to keep per file. Defaults to the configured retention.
    #[serde(default)]
    pub keep: Option<usize>,
}

// ── Query params ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HelpParams {
    /// Category (e.g. `event`) or tool name (e.g. `add_dialogue`).
    #[serde(default)]
    pub topic: Option<String>,
}
