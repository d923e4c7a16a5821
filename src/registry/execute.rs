use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::audit;
use crate::error::AppError;
use crate::state::AppState;

use super::{Command, CommandOutput};

/// Execute a Command against the application state.
/// This is the single dispatch point for all surfaces (stdio, HTTP, CLI).
pub fn execute(state: &Arc<AppState>, cmd: Command) -> Result<CommandOutput, AppError> {
    cmd.dispatch(state)
}

/// Parse a (tool name, JSON arguments) pair, execute it and record it in the
/// audit log when enabled.
pub fn execute_tool_call(
    state: &Arc<AppState>,
    name: &str,
    input: &Value,
) -> Result<CommandOutput, AppError> {
    let started = Instant::now();
    let result = Command::from_tool_call(name, input).and_then(|cmd| execute(state, cmd));

    match &result {
        Ok(_) => tracing::debug!(tool = name, elapsed_ms = started.elapsed().as_millis(), "tool call ok"),
        Err(e) => tracing::warn!(tool = name, code = e.code(), error = %e, "tool call failed"),
    }

    if state.settings.audit_log {
        let failure = result.as_ref().err().map(AppError::to_tool_message);
        let outcome = match (&result, &failure) {
            (Ok(out), _) => Ok(out.message.as_str()),
            (Err(_), Some(msg)) => Err(msg.as_str()),
            (Err(_), None) => Err(""),
        };
        audit::log_tool_call(&state.config_dir, name, input, outcome, started.elapsed());
    }

    result
}
