pub mod catalog;
pub mod execute;
pub mod handlers;
pub mod params;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Param types (used in Command enum) ──────────────────────────
use params::{
    AddActorParams, AddChoiceParams, AddConditionalBranchParams, AddDialogueParams,
    AddItemParams, AddSkillParams, BackupFileParams, CreateMapParams, DataFileParams,
    DeleteEventCommandParams, DrawMapTileParams, HelpParams, InsertEventCommandParams,
    InsertPageParams, ListAssetsParams, PageParams, ProjectParams, PruneBackupsParams,
    SearchEventsParams, ShowPictureParams, UpdateEventCommandParams, UpdatePluginsConfigParams,
    WriteDataFileParams, WritePluginCodeParams,
};

// ── Return types (used in CommandResult enum) ───────────────────
use crate::annotate::AnnotatedCommand;
use crate::mz::plugins::PluginEntry;
use crate::mz::EventCommand;
use crate::search::SearchMatch;
use crate::structure::StructureReport;

use handlers::backup::{FileBackups, RestoredBackup};
use handlers::project::{AssetListing, IntegrityIssue, ProjectInfo};

// ── Handler modules (dispatch targets) ──────────────────────────
use handlers::{backup, database, events, map, plugins, project, query};

// ── Command metadata ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandCategory {
    Project,
    Event,
    Map,
    Database,
    Plugin,
    Backup,
    Query,
}

impl CommandCategory {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Event => "event",
            Self::Map => "map",
            Self::Database => "database",
            Self::Plugin => "plugin",
            Self::Backup => "backup",
            Self::Query => "query",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Project => "Project info, raw data files and assets",
            Self::Event => "Read, edit, search and check event command lists",
            Self::Map => "Create maps and draw tiles",
            Self::Database => "Append actors, items and skills",
            Self::Plugin => "Plugin source files and the js/plugins.js list",
            Self::Backup => "List, restore and prune data file backups",
            Self::Query => "Tool discovery",
        }
    }

    pub fn all() -> &'static [CommandCategory] {
        &[
            Self::Project,
            Self::Event,
            Self::Map,
            Self::Database,
            Self::Plugin,
            Self::Backup,
            Self::Query,
        ]
    }
}

pub struct CommandInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub category: CommandCategory,
    /// Writes a data file (and so leaves a backup behind).
    pub mutating: bool,
}

// ── Command output ──────────────────────────────────────────────

/// Internal result of executing a Command.
/// `message` is what text transports show, `result` carries typed data.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    pub message: String,
    pub result: CommandResult,
}

impl CommandOutput {
    pub fn new(message: impl Into<String>, result: CommandResult) -> Self {
        Self {
            message: message.into(),
            result,
        }
    }
}

/// 2-space pretty JSON for read results shown as text.
pub(crate) fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

// ── define_commands! macro ──────────────────────────────────────

/// Single source of truth for all tools. Generates:
/// 1. `Command` enum
/// 2. `CommandResult` enum (serde-tagged)
/// 3. `Command::info()`: name, description, category, mutating
/// 4. `Command::dispatch()`: run the handler
/// 5. `Command::registry_entries()`: catalog entries with JSON schemas
/// 6. `Command::from_tool_call()`: deserialize from a (name, JSON) pair
macro_rules! define_commands {
    (
        params {
            $(
                [ $pc:expr $(, $pf:ident)* ]
                $pv:ident ( $pp:ty ) $( -> $pr:ty )?
                => $ph:path, $pn:literal : $pd:literal ;
            )*
        }
        no_params {
            $(
                [ $nc:expr $(, $nf:ident)* ]
                $nv:ident $( -> $nr:ty )?
                => $nh:path, $nn:literal : $nd:literal ;
            )*
        }
    ) => {
        // ── 1. Command enum ──
        /// Unified tool call. Every surface (stdio, HTTP, CLI) dispatches
        /// through the same executor. Adding a variant causes compiler errors
        /// until it's fully handled.
        #[derive(Debug, Clone)]
        pub enum Command {
            $( $pv($pp), )*
            $( $nv, )*
        }

        // ── 2. CommandResult enum ──
        /// Typed result for every tool, tagged by tool variant.
        #[derive(Debug, Clone, Serialize)]
        #[serde(tag = "command", content = "data")]
        pub enum CommandResult {
            $( $pv $( ($pr) )?, )*
            $( $nv $( ($nr) )?, )*
        }

        // ── 3. Command::info() ──
        impl Command {
            pub fn info(&self) -> CommandInfo {
                match self {
                    $( Command::$pv(_) => CommandInfo {
                        name: $pn,
                        description: $pd,
                        category: $pc,
                        mutating: define_commands!(@has_flag mutating; $($pf)*),
                    }, )*
                    $( Command::$nv => CommandInfo {
                        name: $nn,
                        description: $nd,
                        category: $nc,
                        mutating: define_commands!(@has_flag mutating; $($nf)*),
                    }, )*
                }
            }
        }

        // ── 4. Command::dispatch() ──
        impl Command {
            pub(crate) fn dispatch(
                self,
                state: &std::sync::Arc<crate::state::AppState>,
            ) -> Result<CommandOutput, crate::error::AppError> {
                match self {
                    $( Command::$pv(p) => $ph(state, p), )*
                    $( Command::$nv => $nh(state), )*
                }
            }
        }

        // ── 5. Command::registry_entries() ──
        impl Command {
            pub(crate) fn registry_entries() -> Vec<catalog::CommandRegistryEntry> {
                vec![
                    $( catalog::entry(
                        CommandInfo {
                            name: $pn,
                            description: $pd,
                            category: $pc,
                            mutating: define_commands!(@has_flag mutating; $($pf)*),
                        },
                        catalog::schema_value::<$pp>(),
                    ), )*
                    $( catalog::entry(
                        CommandInfo {
                            name: $nn,
                            description: $nd,
                            category: $nc,
                            mutating: define_commands!(@has_flag mutating; $($nf)*),
                        },
                        catalog::empty_object_schema(),
                    ), )*
                ]
            }
        }

        // ── 6. Command::from_tool_call() ──
        impl Command {
            pub fn from_tool_call(
                name: &str,
                input: &serde_json::Value,
            ) -> Result<Command, crate::error::AppError> {
                match name {
                    $( $pn => Ok(Command::$pv(catalog::de(input)?)), )*
                    $( $nn => Ok(Command::$nv), )*
                    _ => Err(crate::error::AppError::UnknownTool { name: name.to_string() }),
                }
            }
        }
    };

    // Flag helper: does `mutating` appear in the flag list?
    (@has_flag mutating; mutating $($rest:ident)*) => { true };
    (@has_flag mutating; $_other:ident $($rest:ident)*) => { define_commands!(@has_flag mutating; $($rest)*) };
    (@has_flag mutating;) => { false };
}

// ── Command definitions ─────────────────────────────────────────

define_commands! {
    params {
        // ── Project (6) ─────────────────────────────────────────
        [CommandCategory::Project]
        GetProjectInfo(ProjectParams) -> ProjectInfo
        => project::get_project_info, "get_project_info": "Get basic information about the RPG Maker MZ project from System.json.";

        [CommandCategory::Project]
        ListDataFiles(ProjectParams) -> Vec<String>
        => project::list_data_files, "list_data_files": "List all JSON data files in the project's data directory.";

        [CommandCategory::Project]
        ReadDataFile(DataFileParams) -> Value
        => project::read_data_file, "read_data_file": "Read a JSON file from the data directory.";

        [CommandCategory::Project, mutating]
        WriteDataFile(WriteDataFileParams)
        => project::write_data_file, "write_data_file": "Replace a JSON file in the data directory. The previous content is backed up.";

        [CommandCategory::Project]
        ListAssets(ListAssetsParams) -> AssetListing
        => project::list_assets, "list_assets": "List files under img/ and/or audio/ as project-relative paths.";

        [CommandCategory::Project]
        CheckAssetsIntegrity(ProjectParams) -> Vec<IntegrityIssue>
        => project::check_assets_integrity, "check_assets_integrity": "Report missing actor character images and map files absent from MapInfos.json.";

        // ── Event (12) ──────────────────────────────────────────
        [CommandCategory::Event]
        GetEventPage(PageParams) -> Vec<AnnotatedCommand>
        => events::get_event_page, "get_event_page": "Get an event page's command list with readable annotations.";

        [CommandCategory::Event, mutating]
        AddDialogue(AddDialogueParams) -> usize
        => events::add_dialogue, "add_dialogue": "Insert a Show Text block: one header plus one line command per text line. Returns the insert index.";

        [CommandCategory::Event, mutating]
        AddChoice(AddChoiceParams) -> usize
        => events::add_choice, "add_choice": "Insert a Show Choices block with one branch per option. Returns the insert index.";

        [CommandCategory::Event, mutating]
        AddLoop(InsertPageParams) -> usize
        => events::add_loop, "add_loop": "Insert an empty Loop / Repeat Above pair. Returns the insert index.";

        [CommandCategory::Event, mutating]
        AddBreakLoop(InsertPageParams) -> usize
        => events::add_break_loop, "add_break_loop": "Insert a Break Loop command. Returns the insert index.";

        [CommandCategory::Event, mutating]
        AddConditionalBranch(AddConditionalBranchParams) -> usize
        => events::add_conditional_branch, "add_conditional_branch": "Insert a Conditional Branch with optional Else and its Branch End. Returns the insert index.";

        [CommandCategory::Event, mutating]
        ShowPicture(ShowPictureParams) -> usize
        => events::show_picture, "show_picture": "Insert a Show Picture command. Returns the insert index.";

        [CommandCategory::Event, mutating]
        InsertEventCommand(InsertEventCommandParams) -> usize
        => events::insert_event_command, "insert_event_command": "Insert one raw command {code, indent, parameters}. Returns the insert index.";

        [CommandCategory::Event, mutating]
        DeleteEventCommand(DeleteEventCommandParams) -> EventCommand
        => events::delete_event_command, "delete_event_command": "Delete one command by index. Block partners are not removed; use check_event_page afterwards.";

        [CommandCategory::Event, mutating]
        UpdateEventCommand(UpdateEventCommandParams) -> EventCommand
        => events::update_event_command, "update_event_command": "Replace one command by index with {code, indent, parameters}.";

        [CommandCategory::Event]
        SearchEvents(SearchEventsParams) -> Vec<SearchMatch>
        => events::search_events, "search_events": "Search common events, map events and troop events for text or a command code.";

        [CommandCategory::Event]
        CheckEventPage(PageParams) -> StructureReport
        => events::check_event_page, "check_event_page": "Check an event page's block pairing and indentation. Read-only.";

        // ── Map (2) ─────────────────────────────────────────────
        [CommandCategory::Map, mutating]
        DrawMapTile(DrawMapTileParams)
        => map::draw_map_tile, "draw_map_tile": "Set one tile id at (x, y) on a layer (0-5).";

        [CommandCategory::Map, mutating]
        CreateMap(CreateMapParams) -> u32
        => map::create_map, "create_map": "Create an empty map and register it in MapInfos.json. Returns the new map id.";

        // ── Database (3) ────────────────────────────────────────
        [CommandCategory::Database, mutating]
        AddActor(AddActorParams) -> usize
        => database::add_actor, "add_actor": "Append an actor to Actors.json. Returns the new id.";

        [CommandCategory::Database, mutating]
        AddItem(AddItemParams) -> usize
        => database::add_item, "add_item": "Append an item to Items.json. Returns the new id.";

        [CommandCategory::Database, mutating]
        AddSkill(AddSkillParams) -> usize
        => database::add_skill, "add_skill": "Append a skill to Skills.json. Returns the new id.";

        // ── Plugin (3) ──────────────────────────────────────────
        [CommandCategory::Plugin, mutating]
        WritePluginCode(WritePluginCodeParams)
        => plugins::write_plugin_code, "write_plugin_code": "Write a plugin source file to js/plugins. An existing file is backed up first.";

        [CommandCategory::Plugin]
        GetPluginsConfig(ProjectParams) -> Vec<PluginEntry>
        => plugins::get_plugins_config, "get_plugins_config": "Read the plugin list from js/plugins.js.";

        [CommandCategory::Plugin, mutating]
        UpdatePluginsConfig(UpdatePluginsConfigParams) -> usize
        => plugins::update_plugins_config, "update_plugins_config": "Replace the plugin list in js/plugins.js. Returns the number of plugins written.";

        // ── Backup (3) ──────────────────────────────────────────
        [CommandCategory::Backup]
        ListBackups(BackupFileParams) -> Vec<FileBackups>
        => backup::list_backups, "list_backups": "List backups of one data file, or of every data file that has any.";

        [CommandCategory::Backup]
        UndoLastChange(BackupFileParams) -> RestoredBackup
        => backup::undo_last_change, "undo_last_change": "Restore a data file (default: the most recently modified) from its newest backup.";

        [CommandCategory::Backup]
        PruneBackups(PruneBackupsParams) -> usize
        => backup::prune_backups, "prune_backups": "Delete all but the newest backups of one or every data file. Returns how many were removed.";

        // ── Query (1) ───────────────────────────────────────────
        [CommandCategory::Query]
        Help(HelpParams) -> String
        => query::help, "help": "Discover available tools. Call with no args for categories, or with a topic for details.";
    }
    no_params {
        [CommandCategory::Event]
        GetCommandReference -> Value
        => events::get_command_reference, "get_command_reference": "Get the event command code reference.";
    }
}
