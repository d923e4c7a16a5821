#![allow(clippy::needless_pass_by_value)]

use std::sync::Arc;

use crate::annotate;
use crate::error::AppError;
use crate::mutator;
use crate::mz::codes;
use crate::mz::EventCommand;
use crate::registry::params::{
    AddChoiceParams, AddConditionalBranchParams, AddDialogueParams, DeleteEventCommandParams,
    InsertEventCommandParams, InsertPageParams, PageParams, SearchEventsParams, ShowPictureParams,
    UpdateEventCommandParams,
};
use crate::registry::{pretty, CommandOutput, CommandResult};
use crate::search;
use crate::state::AppState;
use crate::store;
use crate::structure;

/// Splice an already-built group into one page and save. Returns the index
/// of the group's first command.
fn insert_group(
    state: &AppState,
    page: &PageParams,
    raw_position: i64,
    group: Vec<EventCommand>,
) -> Result<usize, AppError> {
    let store = state.store(&page.project_path)?;
    store.edit_page(page.map_id, page.event_id, page.page_index, |list| {
        mutator::insert_block(list, raw_position, group)
    })
}

pub fn get_event_page(state: &Arc<AppState>, p: PageParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let map = store.load_map(p.map_id)?;
    let list = store::page(&map, p.map_id, p.event_id, p.page_index)?;
    let annotated = annotate::annotate_list(list);
    Ok(CommandOutput::new(pretty(&annotated), CommandResult::GetEventPage(annotated)))
}

pub fn add_dialogue(state: &Arc<AppState>, p: AddDialogueParams) -> Result<CommandOutput, AppError> {
    let group = mutator::dialogue(&p.dialogue, p.at.indent)?;
    let at = insert_group(state, &p.page, p.at.insert_position, group)?;
    Ok(CommandOutput::new("Added dialogue.", CommandResult::AddDialogue(at)))
}

pub fn add_choice(state: &Arc<AppState>, p: AddChoiceParams) -> Result<CommandOutput, AppError> {
    let group = mutator::choices(&p.choices, p.at.indent)?;
    let at = insert_group(state, &p.page, p.at.insert_position, group)?;
    Ok(CommandOutput::new(
        format!("Added choice with {} options.", p.choices.options.len()),
        CommandResult::AddChoice(at),
    ))
}

pub fn add_loop(state: &Arc<AppState>, p: InsertPageParams) -> Result<CommandOutput, AppError> {
    let at = insert_group(state, &p.page, p.at.insert_position, mutator::loop_block(p.at.indent))?;
    Ok(CommandOutput::new("Successfully added Loop block.", CommandResult::AddLoop(at)))
}

pub fn add_break_loop(state: &Arc<AppState>, p: InsertPageParams) -> Result<CommandOutput, AppError> {
    let at = insert_group(state, &p.page, p.at.insert_position, mutator::break_loop(p.at.indent))?;
    Ok(CommandOutput::new(
        "Successfully added Break Loop command.",
        CommandResult::AddBreakLoop(at),
    ))
}

pub fn add_conditional_branch(
    state: &Arc<AppState>,
    p: AddConditionalBranchParams,
) -> Result<CommandOutput, AppError> {
    let group = mutator::conditional_branch(&p.condition, p.include_else, p.at.indent);
    let at = insert_group(state, &p.page, p.at.insert_position, group)?;
    Ok(CommandOutput::new(
        "Successfully added Conditional Branch.",
        CommandResult::AddConditionalBranch(at),
    ))
}

pub fn show_picture(state: &Arc<AppState>, p: ShowPictureParams) -> Result<CommandOutput, AppError> {
    let group = mutator::show_picture(&p.picture, p.at.indent);
    let at = insert_group(state, &p.page, p.at.insert_position, group)?;
    Ok(CommandOutput::new(
        format!(
            "Added show picture command for \"{}\" (ID: {}).",
            p.picture.picture_name, p.picture.picture_id
        ),
        CommandResult::ShowPicture(at),
    ))
}

pub fn insert_event_command(
    state: &Arc<AppState>,
    p: InsertEventCommandParams,
) -> Result<CommandOutput, AppError> {
    let command = EventCommand::from_value(&p.new_command)?;
    let store = state.store(&p.page.project_path)?;
    let at = store.edit_page(p.page.map_id, p.page.event_id, p.page.page_index, |list| {
        mutator::insert_command(list, p.insert_position, command)
    })?;
    Ok(CommandOutput::new(
        format!("Successfully inserted command at index {at}."),
        CommandResult::InsertEventCommand(at),
    ))
}

pub fn delete_event_command(
    state: &Arc<AppState>,
    p: DeleteEventCommandParams,
) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.page.project_path)?;
    let removed = store.edit_page(p.page.map_id, p.page.event_id, p.page.page_index, |list| {
        mutator::delete_command(list, p.command_index)
    })?;
    Ok(CommandOutput::new(
        format!("Successfully deleted command at index {}.", p.command_index),
        CommandResult::DeleteEventCommand(removed),
    ))
}

pub fn update_event_command(
    state: &Arc<AppState>,
    p: UpdateEventCommandParams,
) -> Result<CommandOutput, AppError> {
    let command = EventCommand::from_value(&p.new_command)?;
    let store = state.store(&p.page.project_path)?;
    let old = store.edit_page(p.page.map_id, p.page.event_id, p.page.page_index, |list| {
        mutator::update_command(list, p.command_index, command)
    })?;
    Ok(CommandOutput::new(
        format!("Successfully updated command at index {}.", p.command_index),
        CommandResult::UpdateEventCommand(old),
    ))
}

pub fn search_events(state: &Arc<AppState>, p: SearchEventsParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let found = search::search_events(&store, &p.query)?;
    let message = if found.is_empty() {
        format!("No matches for \"{}\".", p.query)
    } else {
        pretty(&found)
    };
    Ok(CommandOutput::new(message, CommandResult::SearchEvents(found)))
}

pub fn check_event_page(state: &Arc<AppState>, p: PageParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let map = store.load_map(p.map_id)?;
    let list = store::page(&map, p.map_id, p.event_id, p.page_index)?;
    let report = structure::check_list(list);
    let message = if report.ok {
        format!("Page is well-formed ({} commands).", report.command_count)
    } else {
        format!("Found {} structural issue(s):\n{}", report.issues.len(), pretty(&report.issues))
    };
    Ok(CommandOutput::new(message, CommandResult::CheckEventPage(report)))
}

pub fn get_command_reference(_state: &Arc<AppState>) -> Result<CommandOutput, AppError> {
    let reference = codes::command_reference();
    Ok(CommandOutput::new(pretty(&reference), CommandResult::GetCommandReference(reference)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::backup;
    use crate::error::ErrorKind;
    use crate::settings::Settings;
    use crate::store::tests::fixture_project;
    use crate::store::ProjectStore;
    use serde_json::json;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Settings::default(), std::env::temp_dir()))
    }

    fn page_params(dir: &tempfile::TempDir, page_index: usize) -> PageParams {
        PageParams {
            project_path: dir.path().into(),
            map_id: 1,
            event_id: 1,
            page_index,
        }
    }

    fn codes_of(dir: &tempfile::TempDir, page_index: usize) -> Vec<u32> {
        let store = ProjectStore::open(dir.path()).unwrap();
        let map = store.load_map(1).unwrap();
        store::page(&map, 1, 1, page_index)
            .unwrap()
            .iter()
            .map(|c| c.code)
            .collect()
    }

    #[test]
    fn loop_lands_before_terminator() {
        let dir = fixture_project();
        let out = add_loop(
            &state(),
            InsertPageParams {
                page: page_params(&dir, 1),
                at: serde_json::from_value(json!({})).unwrap(),
            },
        )
        .unwrap();
        assert!(matches!(out.result, CommandResult::AddLoop(2)));
        assert_eq!(codes_of(&dir, 1), vec![101, 401, 112, 413, 0]);
    }

    #[test]
    fn invalid_intent_writes_nothing() {
        let dir = fixture_project();
        let p: AddChoiceParams = serde_json::from_value(json!({
            "projectPath": dir.path(), "mapId": 1, "eventId": 1, "pageIndex": 0,
            "options": []
        }))
        .unwrap();
        let err = add_choice(&state(), p).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let store = ProjectStore::open(dir.path()).unwrap();
        assert!(backup::list_backups(&store.map_path(1)).unwrap().is_empty());
    }

    #[test]
    fn delete_then_update_report_old_commands() {
        let dir = fixture_project();
        let out = delete_event_command(
            &state(),
            DeleteEventCommandParams {
                page: page_params(&dir, 1),
                command_index: 1,
            },
        )
        .unwrap();
        assert_eq!(out.message, "Successfully deleted command at index 1.");
        let CommandResult::DeleteEventCommand(removed) = out.result else {
            unreachable!()
        };
        assert_eq!(removed.parameters, vec![json!("Halt!")]);

        let out = update_event_command(
            &state(),
            UpdateEventCommandParams {
                page: page_params(&dir, 1),
                command_index: 0,
                new_command: json!({"code": 230, "indent": 0, "parameters": [60]}),
            },
        )
        .unwrap();
        let CommandResult::UpdateEventCommand(old) = out.result else {
            unreachable!()
        };
        assert_eq!(old.code, 101);
        assert_eq!(codes_of(&dir, 1), vec![230, 0]);
    }

    #[test]
    fn terminator_is_protected() {
        let dir = fixture_project();
        let err = delete_event_command(
            &state(),
            DeleteEventCommandParams {
                page: page_params(&dir, 0),
                command_index: 0,
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(codes_of(&dir, 0), vec![0]);
    }

    #[test]
    fn check_reports_broken_pairing() {
        let dir = fixture_project();
        insert_event_command(
            &state(),
            InsertEventCommandParams {
                page: page_params(&dir, 0),
                insert_position: 0,
                new_command: json!({"code": 112, "indent": 0, "parameters": []}),
            },
        )
        .unwrap();
        let out = check_event_page(&state(), page_params(&dir, 0)).unwrap();
        let CommandResult::CheckEventPage(report) = out.result else {
            unreachable!()
        };
        assert!(!report.ok);
        assert!(out.message.starts_with("Found "));
    }

    #[test]
    fn annotated_page_has_descriptions() {
        let dir = fixture_project();
        let out = get_event_page(&state(), page_params(&dir, 1)).unwrap();
        assert!(out.message.contains("\"_description\": \"Text: Halt!\""));
    }
}
