//! Command list mutation.
//!
//! Block builders are pure functions from an editing intent to the command
//! group that encodes it. Every group is inserted with a single `splice`, so a
//! list is never observed with half a block in it. Raw delete/update work on
//! single commands and do not repair block pairing; see [`crate::structure`]
//! for the checker.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::mz::codes;
use crate::mz::EventCommand;

// ── Positions ───────────────────────────────────────────────────────

/// `-1` inserts just before the list's final element (the terminator).
pub const BEFORE_TERMINATOR: i64 = -1;

/// Resolve a caller-supplied insert position against a list of length `len`.
///
/// `-1` means `len - 1`; any other value must be a literal index in `[0, len]`.
pub fn resolve_position(len: usize, raw: i64) -> Result<usize, AppError> {
    if raw == BEFORE_TERMINATOR {
        return len
            .checked_sub(1)
            .ok_or_else(|| AppError::invalid("insertPosition", "-1 needs a non-empty list"));
    }
    usize::try_from(raw)
        .ok()
        .filter(|&pos| pos <= len)
        .ok_or_else(|| AppError::IndexOutOfBounds {
            what: "Insert position".into(),
            index: raw,
            len,
        })
}

fn existing_index(len: usize, raw: i64) -> Result<usize, AppError> {
    usize::try_from(raw)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| AppError::IndexOutOfBounds {
            what: "Command".into(),
            index: raw,
            len,
        })
}

// ── Intents ─────────────────────────────────────────────────────────

/// A dialogue window: face settings plus one or more text lines.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dialogue {
    /// Message text; each `\n`-separated line becomes one text command.
    pub text: String,
    #[serde(default)]
    pub face: String,
    #[serde(default)]
    pub face_index: u32,
    /// 0 window, 1 dim, 2 transparent.
    #[serde(default)]
    pub background: u32,
    /// 0 top, 1 middle, 2 bottom.
    #[serde(default = "default_window_position")]
    pub position: u32,
    #[serde(default)]
    pub speaker_name: Option<String>,
}

fn default_window_position() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Choices {
    pub options: Vec<String>,
    /// -1 disallow cancel, -2 cancel branch, otherwise the option chosen on cancel.
    #[serde(default = "default_cancel_type")]
    pub cancel_type: i64,
    /// Initially highlighted option, -1 for none.
    #[serde(default)]
    pub default_type: i64,
    /// 0 left, 1 middle, 2 right.
    #[serde(default = "default_choice_position")]
    pub position_type: u32,
    #[serde(default)]
    pub background: u32,
}

fn default_cancel_type() -> i64 {
    -1
}

fn default_choice_position() -> u32 {
    2
}

/// The predicate of a conditional branch: `{code, dataA, operation, dataB, class}`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (0 switch, 1 variable, 2 self switch, ...).
    pub code: i64,
    pub data_a: Value,
    pub operation: Value,
    pub data_b: Value,
    #[serde(default)]
    pub class: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Picture {
    #[serde(default = "default_picture_id")]
    pub picture_id: u32,
    pub picture_name: String,
    /// 0 upper-left, 1 center.
    #[serde(default)]
    pub origin: u32,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

fn default_picture_id() -> u32 {
    1
}

// ── Block builders ──────────────────────────────────────────────────

/// `101` header followed by one `401` per line.
pub fn dialogue(intent: &Dialogue, indent: u32) -> Result<Vec<EventCommand>, AppError> {
    if intent.text.is_empty() {
        return Err(AppError::invalid("text", "dialogue text must not be empty"));
    }
    let mut header = vec![
        json!(intent.face),
        json!(intent.face_index),
        json!(intent.background),
        json!(intent.position),
    ];
    if let Some(speaker) = &intent.speaker_name {
        header.push(json!(speaker));
    }

    let mut group = vec![EventCommand::new(codes::SHOW_TEXT, indent, header)];
    group.extend(intent.text.split('\n').map(|line| {
        let line = line.strip_suffix('\r').unwrap_or(line);
        EventCommand::new(codes::TEXT_LINE, indent, vec![json!(line)])
    }));
    Ok(group)
}

/// `102`, then `402` + an empty body per option, then `404`.
pub fn choices(intent: &Choices, indent: u32) -> Result<Vec<EventCommand>, AppError> {
    if intent.options.is_empty() {
        return Err(AppError::invalid("options", "at least one option is required"));
    }
    let mut group = Vec::with_capacity(intent.options.len() * 2 + 2);
    group.push(EventCommand::new(
        codes::SHOW_CHOICES,
        indent,
        vec![
            json!(intent.options),
            json!(intent.cancel_type),
            json!(intent.default_type),
            json!(intent.position_type),
            json!(intent.background),
        ],
    ));
    for (i, option) in intent.options.iter().enumerate() {
        group.push(EventCommand::new(codes::WHEN, indent, vec![json!(i), json!(option)]));
        group.push(EventCommand::terminator(indent + 1));
    }
    group.push(EventCommand::bare(codes::CHOICES_END, indent));
    Ok(group)
}

/// `112` / `413`. The body is filled by later inserts between the two.
pub fn loop_block(indent: u32) -> Vec<EventCommand> {
    vec![
        EventCommand::bare(codes::LOOP, indent),
        EventCommand::bare(codes::REPEAT_ABOVE, indent),
    ]
}

/// Single `113`. Loop nesting is not verified.
pub fn break_loop(indent: u32) -> Vec<EventCommand> {
    vec![EventCommand::bare(codes::BREAK_LOOP, indent)]
}

/// `111` [, `411`], `412`.
pub fn conditional_branch(condition: &Condition, include_else: bool, indent: u32) -> Vec<EventCommand> {
    let class = match &condition.class {
        None | Some(Value::Null) => json!(0),
        Some(v) => v.clone(),
    };
    let mut group = vec![EventCommand::new(
        codes::CONDITIONAL_BRANCH,
        indent,
        vec![
            json!(condition.code),
            condition.data_a.clone(),
            condition.operation.clone(),
            condition.data_b.clone(),
            class,
        ],
    )];
    if include_else {
        group.push(EventCommand::bare(codes::ELSE, indent));
    }
    group.push(EventCommand::bare(codes::BRANCH_END, indent));
    group
}

/// Single `231` with the fixed nine-field tuple. Scale, opacity and blend
/// mode are always 100/100/255/normal.
pub fn show_picture(picture: &Picture, indent: u32) -> Vec<EventCommand> {
    vec![EventCommand::new(
        codes::SHOW_PICTURE,
        indent,
        vec![
            json!(picture.picture_id),
            json!(picture.picture_name),
            json!(picture.origin),
            json!(picture.x),
            json!(picture.y),
            json!(100),
            json!(100),
            json!(255),
            json!(0),
        ],
    )]
}

// ── Splicing ────────────────────────────────────────────────────────

/// Insert a whole group at `raw_position` in one splice. Returns the
/// resolved index of the group's first command.
pub fn insert_block(
    list: &mut Vec<EventCommand>,
    raw_position: i64,
    group: Vec<EventCommand>,
) -> Result<usize, AppError> {
    let pos = resolve_position(list.len(), raw_position)?;
    list.splice(pos..pos, group);
    Ok(pos)
}

pub fn insert_command(
    list: &mut Vec<EventCommand>,
    raw_position: i64,
    command: EventCommand,
) -> Result<usize, AppError> {
    insert_block(list, raw_position, vec![command])
}

/// Remove exactly one command. The list's final terminator cannot be removed.
pub fn delete_command(list: &mut Vec<EventCommand>, raw_index: i64) -> Result<EventCommand, AppError> {
    let index = existing_index(list.len(), raw_index)?;
    if index + 1 == list.len() && list.get(index).is_some_and(EventCommand::is_terminator) {
        return Err(AppError::invalid(
            "commandIndex",
            "the final end-of-list command cannot be deleted",
        ));
    }
    Ok(list.remove(index))
}

/// Replace one command by value and return the old one. The final
/// terminator's opcode cannot be changed.
pub fn update_command(
    list: &mut [EventCommand],
    raw_index: i64,
    command: EventCommand,
) -> Result<EventCommand, AppError> {
    let len = list.len();
    let index = existing_index(len, raw_index)?;
    let slot = list.get_mut(index).ok_or_else(|| AppError::IndexOutOfBounds {
        what: "Command".into(),
        index: raw_index,
        len,
    })?;
    if index + 1 == len && slot.is_terminator() && !command.is_terminator() {
        return Err(AppError::invalid(
            "newCommand",
            "the final end-of-list command must keep code 0",
        ));
    }
    Ok(std::mem::replace(slot, command))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    fn hello_world() -> Dialogue {
        Dialogue {
            text: "Hello\nWorld".into(),
            face: String::new(),
            face_index: 0,
            background: 0,
            position: 2,
            speaker_name: None,
        }
    }

    fn page(len: usize) -> Vec<EventCommand> {
        let mut list: Vec<EventCommand> = (0..len.saturating_sub(1))
            .map(|i| EventCommand::new(codes::CONTROL_SWITCHES, 0, vec![json!(i), json!(i), json!(0)]))
            .collect();
        list.push(EventCommand::terminator(0));
        list
    }

    #[test]
    fn dialogue_on_empty_page() {
        let mut list = page(1);
        let group = dialogue(&hello_world(), 0).unwrap();
        insert_block(&mut list, -1, group).unwrap();

        let codes: Vec<u32> = list.iter().map(|c| c.code).collect();
        assert_eq!(codes, vec![101, 401, 401, 0]);
        assert_eq!(list[0].parameters, vec![json!(""), json!(0), json!(0), json!(2)]);
        assert_eq!(list[1].parameters, vec![json!("Hello")]);
        assert_eq!(list[2].parameters, vec![json!("World")]);
    }

    #[test]
    fn dialogue_strips_carriage_returns_and_adds_speaker() {
        let mut intent = hello_world();
        intent.text = "a\r\nb".into();
        intent.speaker_name = Some("Harold".into());
        let group = dialogue(&intent, 1).unwrap();
        assert_eq!(group[0].parameters.len(), 5);
        assert_eq!(group[0].parameters[4], json!("Harold"));
        assert_eq!(group[1].parameters, vec![json!("a")]);
        assert!(group.iter().all(|c| c.indent == 1));
    }

    #[test]
    fn empty_dialogue_is_invalid() {
        let mut intent = hello_world();
        intent.text = String::new();
        let err = dialogue(&intent, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn choices_assign_branches_positionally() {
        let group = choices(
            &Choices {
                options: vec!["Yes".into(), "No".into()],
                cancel_type: -1,
                default_type: 0,
                position_type: 2,
                background: 0,
            },
            0,
        )
        .unwrap();
        let shape: Vec<(u32, u32)> = group.iter().map(|c| (c.code, c.indent)).collect();
        assert_eq!(shape, vec![(102, 0), (402, 0), (0, 1), (402, 0), (0, 1), (404, 0)]);
        assert_eq!(group[0].parameters[0], json!(["Yes", "No"]));
        assert_eq!(group[0].parameters[1], json!(-1));
        assert_eq!(group[3].parameters, vec![json!(1), json!("No")]);
    }

    #[test]
    fn no_options_is_invalid() {
        let err = choices(
            &Choices {
                options: vec![],
                cancel_type: -1,
                default_type: 0,
                position_type: 2,
                background: 0,
            },
            0,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn conditional_with_and_without_else() {
        let cond = Condition {
            code: 0,
            data_a: json!(1),
            operation: json!(0),
            data_b: json!(0),
            class: None,
        };
        let with_else: Vec<u32> = conditional_branch(&cond, true, 0).iter().map(|c| c.code).collect();
        assert_eq!(with_else, vec![111, 411, 412]);
        let without: Vec<EventCommand> = conditional_branch(&cond, false, 0);
        assert_eq!(without.iter().map(|c| c.code).collect::<Vec<_>>(), vec![111, 412]);
        assert_eq!(without[0].parameters, vec![json!(0), json!(1), json!(0), json!(0), json!(0)]);
    }

    #[test]
    fn picture_has_fixed_tuple() {
        let group = show_picture(
            &Picture {
                picture_id: 3,
                picture_name: "Sky".into(),
                origin: 1,
                x: 10,
                y: 20,
            },
            0,
        );
        assert_eq!(
            group[0].parameters,
            vec![json!(3), json!("Sky"), json!(1), json!(10), json!(20), json!(100), json!(100), json!(255), json!(0)]
        );
    }

    #[test]
    fn break_inside_fresh_loop() {
        let mut list = page(1);
        insert_block(&mut list, -1, loop_block(0)).unwrap();
        insert_block(&mut list, 1, break_loop(0)).unwrap();
        let codes: Vec<u32> = list.iter().map(|c| c.code).collect();
        assert_eq!(codes, vec![112, 113, 413, 0]);
    }

    #[test]
    fn position_resolution() {
        assert_eq!(resolve_position(3, -1).unwrap(), 2);
        assert_eq!(resolve_position(3, 0).unwrap(), 0);
        assert_eq!(resolve_position(3, 3).unwrap(), 3);
        assert_eq!(resolve_position(3, 4).unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(resolve_position(3, -2).unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(resolve_position(0, -1).unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn bad_position_leaves_list_untouched() {
        let mut list = page(2);
        let before = list.clone();
        assert!(insert_block(&mut list, 9, loop_block(0)).is_err());
        assert_eq!(list, before);
    }

    #[test]
    fn update_one_past_end_is_out_of_bounds() {
        let mut list = page(3);
        let before = list.clone();
        let err = update_command(&mut list, 3, EventCommand::bare(113, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        assert_eq!(list, before);
    }

    #[test]
    fn update_replaces_and_returns_old() {
        let mut list = page(3);
        let old = update_command(&mut list, 1, EventCommand::bare(113, 0)).unwrap();
        assert_eq!(old.code, codes::CONTROL_SWITCHES);
        assert_eq!(list[1].code, 113);
    }

    #[test]
    fn terminator_is_protected() {
        let mut list = page(2);
        let err = delete_command(&mut list, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = update_command(&mut list, 1, EventCommand::bare(101, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        // Re-indenting the terminator is allowed
        update_command(&mut list, 1, EventCommand::terminator(0)).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn delete_out_of_bounds() {
        let mut list = page(2);
        assert_eq!(delete_command(&mut list, 2).unwrap_err().kind(), ErrorKind::OutOfBounds);
        assert_eq!(delete_command(&mut list, -1).unwrap_err().kind(), ErrorKind::OutOfBounds);
    }

    fn any_block() -> impl Strategy<Value = Vec<EventCommand>> {
        prop_oneof![
            (1usize..4).prop_map(|lines| {
                let text = vec!["line"; lines].join("\n");
                dialogue(&Dialogue { text, ..hello_world() }, 0).unwrap()
            }),
            Just(loop_block(0)),
            any::<bool>().prop_map(|include_else| conditional_branch(
                &Condition {
                    code: 1,
                    data_a: json!(1),
                    operation: json!(0),
                    data_b: json!(5),
                    class: None,
                },
                include_else,
                0
            )),
            (1usize..5).prop_map(|n| {
                let options = (0..n).map(|i| format!("opt{i}")).collect();
                choices(
                    &Choices {
                        options,
                        cancel_type: -1,
                        default_type: 0,
                        position_type: 2,
                        background: 0,
                    },
                    0,
                )
                .unwrap()
            }),
        ]
    }

    proptest! {
        #[test]
        fn insertion_grows_by_block_and_keeps_prefix(
            len in 1usize..8,
            block in any_block(),
            pick in 0usize..16,
        ) {
            let original = page(len);
            // Every valid position: -1 and 0..=len
            let raw = if pick > len { -1 } else { i64::try_from(pick).unwrap() };
            let pos = resolve_position(len, raw).unwrap();

            let mut list = original.clone();
            insert_block(&mut list, raw, block.clone()).unwrap();

            prop_assert_eq!(list.len(), original.len() + block.len());
            prop_assert_eq!(&list[..pos], &original[..pos]);
            prop_assert_eq!(&list[pos..pos + block.len()], &block[..]);
            prop_assert_eq!(&list[pos + block.len()..], &original[pos..]);
        }

        #[test]
        fn delete_then_reinsert_restores(len in 2usize..10, pick in 0usize..10) {
            let original = page(len);
            let index = pick % (len - 1);
            let mut list = original.clone();
            let removed = delete_command(&mut list, i64::try_from(index).unwrap()).unwrap();
            prop_assert_eq!(list.len(), len - 1);
            insert_command(&mut list, i64::try_from(index).unwrap(), removed).unwrap();
            prop_assert_eq!(list, original);
        }
    }
}
