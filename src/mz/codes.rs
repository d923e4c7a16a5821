//! RPG Maker MZ event command opcodes and their structural roles.
//!
//! Pure data. Nothing here decides how to mutate a list; the mutator and the
//! structure checker read the roles, the annotator reads the names.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

pub const END: u32 = 0;
pub const SHOW_TEXT: u32 = 101;
pub const SHOW_CHOICES: u32 = 102;
pub const INPUT_NUMBER: u32 = 103;
pub const SELECT_ITEM: u32 = 104;
pub const SCROLLING_TEXT: u32 = 105;
pub const COMMENT: u32 = 108;
pub const CONDITIONAL_BRANCH: u32 = 111;
pub const LOOP: u32 = 112;
pub const BREAK_LOOP: u32 = 113;
pub const EXIT_EVENT: u32 = 115;
pub const COMMON_EVENT: u32 = 117;
pub const LABEL: u32 = 118;
pub const JUMP_TO_LABEL: u32 = 119;
pub const CONTROL_SWITCHES: u32 = 121;
pub const CONTROL_VARIABLES: u32 = 122;
pub const CONTROL_SELF_SWITCH: u32 = 123;
pub const CONTROL_TIMER: u32 = 124;
pub const CHANGE_GOLD: u32 = 125;
pub const CHANGE_ITEMS: u32 = 126;
pub const CHANGE_PARTY_MEMBER: u32 = 129;
pub const TRANSFER_PLAYER: u32 = 201;
pub const SET_MOVEMENT_ROUTE: u32 = 205;
pub const FADEOUT_SCREEN: u32 = 221;
pub const FADEIN_SCREEN: u32 = 222;
pub const WAIT: u32 = 230;
pub const SHOW_PICTURE: u32 = 231;
pub const MOVE_PICTURE: u32 = 232;
pub const ERASE_PICTURE: u32 = 235;
pub const PLAY_BGM: u32 = 241;
pub const PLAY_SE: u32 = 250;
pub const BATTLE_PROCESSING: u32 = 301;
pub const GAME_OVER: u32 = 353;
pub const RETURN_TO_TITLE: u32 = 354;
pub const SCRIPT: u32 = 355;
pub const PLUGIN_COMMAND: u32 = 357;
pub const TEXT_LINE: u32 = 401;
pub const WHEN: u32 = 402;
pub const WHEN_CANCEL: u32 = 403;
pub const CHOICES_END: u32 = 404;
pub const SCROLLING_TEXT_LINE: u32 = 405;
pub const COMMENT_LINE: u32 = 408;
pub const ELSE: u32 = 411;
pub const BRANCH_END: u32 = 412;
pub const REPEAT_ABOVE: u32 = 413;
pub const MOVE_ROUTE_STEP: u32 = 505;
pub const SCRIPT_LINE: u32 = 655;
pub const PLUGIN_COMMAND_ARG: u32 = 657;

/// How a command participates in block structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum CommandRole {
    /// The `0` that ends a page list or a block body.
    Terminator,
    Leaf,
    /// Starts a block that a matching closer must end (`102`, `111`, `112`).
    BlockOpener,
    /// Belongs to an opener (`402`, `411`) or extends a header (`401`, `655`).
    Continuation,
    BlockCloser,
}

/// One row of the command catalog.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub code: u32,
    pub name: &'static str,
    pub role: CommandRole,
    /// For continuations: the opener or header they follow.
    /// For closers: the opener they close.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<u32>,
}

const fn entry(code: u32, name: &'static str, role: CommandRole, partner: Option<u32>) -> CatalogEntry {
    CatalogEntry {
        code,
        name,
        role,
        partner,
    }
}

const fn leaf(code: u32, name: &'static str) -> CatalogEntry {
    entry(code, name, CommandRole::Leaf, None)
}

use CommandRole::{BlockCloser, BlockOpener, Continuation, Terminator};

/// The fixed catalog, ordered by opcode.
pub static CATALOG: &[CatalogEntry] = &[
    entry(END, "End", Terminator, None),
    leaf(SHOW_TEXT, "Show Text"),
    entry(SHOW_CHOICES, "Show Choices", BlockOpener, None),
    leaf(INPUT_NUMBER, "Input Number"),
    leaf(SELECT_ITEM, "Select Item"),
    leaf(SCROLLING_TEXT, "Show Scrolling Text"),
    leaf(COMMENT, "Comment"),
    entry(CONDITIONAL_BRANCH, "Conditional Branch", BlockOpener, None),
    entry(LOOP, "Loop", BlockOpener, None),
    leaf(BREAK_LOOP, "Break Loop"),
    leaf(EXIT_EVENT, "Exit Event Processing"),
    leaf(COMMON_EVENT, "Common Event"),
    leaf(LABEL, "Label"),
    leaf(JUMP_TO_LABEL, "Jump to Label"),
    leaf(CONTROL_SWITCHES, "Control Switches"),
    leaf(CONTROL_VARIABLES, "Control Variables"),
    leaf(CONTROL_SELF_SWITCH, "Control Self Switch"),
    leaf(CONTROL_TIMER, "Control Timer"),
    leaf(CHANGE_GOLD, "Change Gold"),
    leaf(CHANGE_ITEMS, "Change Items"),
    leaf(CHANGE_PARTY_MEMBER, "Change Party Member"),
    leaf(TRANSFER_PLAYER, "Transfer Player"),
    leaf(SET_MOVEMENT_ROUTE, "Set Movement Route"),
    leaf(FADEOUT_SCREEN, "Fadeout Screen"),
    leaf(FADEIN_SCREEN, "Fadein Screen"),
    leaf(WAIT, "Wait"),
    leaf(SHOW_PICTURE, "Show Picture"),
    leaf(MOVE_PICTURE, "Move Picture"),
    leaf(ERASE_PICTURE, "Erase Picture"),
    leaf(PLAY_BGM, "Play BGM"),
    leaf(PLAY_SE, "Play SE"),
    leaf(BATTLE_PROCESSING, "Battle Processing"),
    leaf(GAME_OVER, "Game Over"),
    leaf(RETURN_TO_TITLE, "Return to Title Screen"),
    leaf(SCRIPT, "Script"),
    leaf(PLUGIN_COMMAND, "Plugin Command"),
    entry(TEXT_LINE, "Text Line", Continuation, Some(SHOW_TEXT)),
    entry(WHEN, "When", Continuation, Some(SHOW_CHOICES)),
    entry(WHEN_CANCEL, "When Cancel", Continuation, Some(SHOW_CHOICES)),
    entry(CHOICES_END, "End Choices", BlockCloser, Some(SHOW_CHOICES)),
    entry(SCROLLING_TEXT_LINE, "Scrolling Text Line", Continuation, Some(SCROLLING_TEXT)),
    entry(COMMENT_LINE, "Comment Line", Continuation, Some(COMMENT)),
    entry(ELSE, "Else", Continuation, Some(CONDITIONAL_BRANCH)),
    entry(BRANCH_END, "Branch End", BlockCloser, Some(CONDITIONAL_BRANCH)),
    entry(REPEAT_ABOVE, "Repeat Above", BlockCloser, Some(LOOP)),
    entry(MOVE_ROUTE_STEP, "Movement Route Step", Continuation, Some(SET_MOVEMENT_ROUTE)),
    entry(SCRIPT_LINE, "Script Line", Continuation, Some(SCRIPT)),
    entry(PLUGIN_COMMAND_ARG, "Plugin Command Argument", Continuation, Some(PLUGIN_COMMAND)),
];

pub fn catalog_entry(code: u32) -> Option<&'static CatalogEntry> {
    CATALOG
        .binary_search_by_key(&code, |e| e.code)
        .ok()
        .and_then(|i| CATALOG.get(i))
}

/// Role of `code`; opcodes outside the catalog are treated as leaves.
pub fn role_of(code: u32) -> CommandRole {
    catalog_entry(code).map_or(CommandRole::Leaf, |e| e.role)
}

/// True when the continuation belongs to an open block rather than a header
/// command (`402`/`403`/`411` versus `401`/`655`).
pub fn continues_block(code: u32) -> bool {
    catalog_entry(code)
        .and_then(|e| e.partner)
        .is_some_and(|p| role_of(p) == CommandRole::BlockOpener)
}

/// Closer that ends the block opened by `opener`.
pub fn closer_for(opener: u32) -> Option<u32> {
    CATALOG
        .iter()
        .find(|e| e.role == CommandRole::BlockCloser && e.partner == Some(opener))
        .map(|e| e.code)
}

/// The whole catalog as a JSON document, grouped by role.
pub fn command_reference() -> Value {
    serde_json::json!({
        "format": "Each command is {\"code\": opcode, \"indent\": nesting depth, \"parameters\": [...]}. \
                   Every page list ends with code 0. Block bodies sit one indent deeper than their opener.",
        "blocks": [
            {"opener": SHOW_CHOICES, "continuations": [WHEN, WHEN_CANCEL], "closer": CHOICES_END},
            {"opener": CONDITIONAL_BRANCH, "continuations": [ELSE], "closer": BRANCH_END},
            {"opener": LOOP, "continuations": [], "closer": REPEAT_ABOVE},
        ],
        "commands": CATALOG,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_sorted_and_unique() {
        for pair in CATALOG.windows(2) {
            if let [a, b] = pair {
                assert!(a.code < b.code, "{} !< {}", a.code, b.code);
            }
        }
    }

    #[test]
    fn roles_cover_block_commands() {
        assert_eq!(role_of(LOOP), CommandRole::BlockOpener);
        assert_eq!(role_of(REPEAT_ABOVE), CommandRole::BlockCloser);
        assert_eq!(role_of(ELSE), CommandRole::Continuation);
        assert_eq!(role_of(END), CommandRole::Terminator);
        assert_eq!(role_of(9999), CommandRole::Leaf);
        assert!(catalog_entry(9999).is_none());
    }

    #[test]
    fn partners_resolve() {
        assert_eq!(closer_for(LOOP), Some(REPEAT_ABOVE));
        assert_eq!(closer_for(SHOW_CHOICES), Some(CHOICES_END));
        assert_eq!(closer_for(CONDITIONAL_BRANCH), Some(BRANCH_END));
        assert_eq!(closer_for(SHOW_TEXT), None);
        assert!(continues_block(WHEN));
        assert!(continues_block(ELSE));
        assert!(!continues_block(TEXT_LINE));
    }

    #[test]
    fn reference_lists_every_command() {
        let doc = command_reference();
        let commands = doc["commands"].as_array().map_or(0, Vec::len);
        assert_eq!(commands, CATALOG.len());
    }
}
