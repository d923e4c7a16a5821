#![allow(clippy::needless_pass_by_value)]

use std::sync::Arc;

use serde_json::Value;

use crate::error::AppError;
use crate::mz::database::{self, ActorSpec, ItemSpec, SkillSpec};
use crate::paths;
use crate::registry::params::{AddActorParams, AddItemParams, AddSkillParams};
use crate::registry::{CommandOutput, CommandResult};
use crate::state::AppState;
use crate::store::ProjectStore;

/// Append one record to a database array; its id is the array length before
/// the push. A missing file starts as `[null]`.
fn append_record(
    store: &ProjectStore,
    filename: &str,
    record: impl FnOnce(usize) -> Value,
) -> Result<usize, AppError> {
    let mut records = store
        .read_data_opt::<Vec<Value>>(filename)?
        .unwrap_or_else(|| vec![Value::Null]);
    let id = records.len();
    records.push(record(id));
    store.write_data_value(filename, &records)?;
    Ok(id)
}

fn require_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::invalid("name", "name must not be empty"));
    }
    Ok(())
}

pub fn add_actor(state: &Arc<AppState>, p: AddActorParams) -> Result<CommandOutput, AppError> {
    require_name(&p.name)?;
    if p.initial_level == 0 || p.initial_level > p.max_level {
        return Err(AppError::invalid(
            "initialLevel",
            format!("must be between 1 and maxLevel ({})", p.max_level),
        ));
    }
    let store = state.store(&p.project_path)?;
    let spec = ActorSpec {
        name: p.name,
        class_id: p.class_id,
        initial_level: p.initial_level,
        max_level: p.max_level,
    };
    let id = append_record(&store, paths::ACTORS_FILE, |id| database::actor_record(id, &spec))?;
    Ok(CommandOutput::new(
        format!("Successfully added actor \"{}\" (ID: {id}).", spec.name),
        CommandResult::AddActor(id),
    ))
}

pub fn add_item(state: &Arc<AppState>, p: AddItemParams) -> Result<CommandOutput, AppError> {
    require_name(&p.name)?;
    let store = state.store(&p.project_path)?;
    let spec = ItemSpec {
        name: p.name,
        price: p.price,
        consumable: p.consumable,
        scope: p.scope,
        occasion: p.occasion,
    };
    let id = append_record(&store, paths::ITEMS_FILE, |id| database::item_record(id, &spec))?;
    Ok(CommandOutput::new(
        format!("Successfully added item \"{}\" (ID: {id}).", spec.name),
        CommandResult::AddItem(id),
    ))
}

pub fn add_skill(state: &Arc<AppState>, p: AddSkillParams) -> Result<CommandOutput, AppError> {
    require_name(&p.name)?;
    let store = state.store(&p.project_path)?;
    let spec = SkillSpec {
        name: p.name,
        mp_cost: p.mp_cost,
        tp_cost: p.tp_cost,
        scope: p.scope,
        occasion: p.occasion,
    };
    let id = append_record(&store, paths::SKILLS_FILE, |id| database::skill_record(id, &spec))?;
    Ok(CommandOutput::new(
        format!("Successfully added skill \"{}\" (ID: {id}).", spec.name),
        CommandResult::AddSkill(id),
    ))
}
