#![allow(clippy::needless_pass_by_value)]

use std::sync::Arc;

use crate::error::AppError;
use crate::paths;
use crate::registry::params::{ProjectParams, UpdatePluginsConfigParams, WritePluginCodeParams};
use crate::registry::{pretty, CommandOutput, CommandResult};
use crate::state::AppState;

pub fn write_plugin_code(state: &Arc<AppState>, p: WritePluginCodeParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    store.write_plugin_source(&p.filename, &p.code)?;
    Ok(CommandOutput::new(
        format!("Successfully wrote plugin {}", p.filename),
        CommandResult::WritePluginCode,
    ))
}

pub fn get_plugins_config(state: &Arc<AppState>, p: ProjectParams) -> Result<CommandOutput, AppError> {
    let store = state.store(&p.project_path)?;
    let list = store.read_plugins()?;
    Ok(CommandOutput::new(pretty(&list), CommandResult::GetPluginsConfig(list)))
}

/// Replaces the whole list. Names must be non-empty and unique, since the
/// engine loads `js/plugins/<name>.js` once per row.
pub fn update_plugins_config(
    state: &Arc<AppState>,
    p: UpdatePluginsConfigParams,
) -> Result<CommandOutput, AppError> {
    for (i, plugin) in p.plugins.iter().enumerate() {
        if plugin.name.trim().is_empty() {
            return Err(AppError::invalid("plugins", format!("plugin {i} has an empty name")));
        }
        if p.plugins.iter().take(i).any(|earlier| earlier.name == plugin.name) {
            return Err(AppError::invalid(
                "plugins",
                format!("plugin \"{}\" is listed more than once", plugin.name),
            ));
        }
    }
    let store = state.store(&p.project_path)?;
    store.write_plugins(&p.plugins)?;
    let count = p.plugins.len();
    Ok(CommandOutput::new(
        format!("Updated {} with {count} plugin(s).", paths::PLUGINS_CONFIG_FILE),
        CommandResult::UpdatePluginsConfig(count),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::backup;
    use crate::error::ErrorKind;
    use crate::settings::Settings;
    use crate::store::tests::fixture_project;
    use serde_json::json;
    use std::fs;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(Settings::default(), std::env::temp_dir()))
    }

    fn update(dir: &tempfile::TempDir, plugins: serde_json::Value) -> Result<CommandOutput, AppError> {
        let p = serde_json::from_value(json!({"projectPath": dir.path(), "plugins": plugins})).unwrap();
        update_plugins_config(&state(), p)
    }

    #[test]
    fn update_then_read_back() {
        let dir = fixture_project();
        let out = update(
            &dir,
            json!([
                {"name": "TextScrollSpeed", "status": true, "description": "Faster text", "parameters": {"speed": "4"}},
                {"name": "AltMenuScreen", "status": false}
            ]),
        )
        .unwrap();
        assert_eq!(out.message, "Updated js/plugins.js with 2 plugin(s).");

        let text = fs::read_to_string(paths::plugins_config(dir.path())).unwrap();
        assert!(text.starts_with("// Generated by RPG Maker."));
        assert!(text.contains(
            "{\"name\":\"AltMenuScreen\",\"status\":false,\"description\":\"\",\"parameters\":{}}\n];"
        ));

        let out = get_plugins_config(&state(), ProjectParams { project_path: dir.path().into() }).unwrap();
        let CommandResult::GetPluginsConfig(list) = out.result else {
            unreachable!()
        };
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].parameters["speed"], "4");
    }

    #[test]
    fn invalid_lists_write_nothing() {
        let dir = fixture_project();
        let err = update(&dir, json!([{"name": " ", "status": true}])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = update(
            &dir,
            json!([{"name": "A", "status": true}, {"name": "A", "status": false}]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
        assert!(!paths::plugins_config(dir.path()).exists());
    }

    #[test]
    fn missing_config_is_not_found() {
        let dir = fixture_project();
        let err = get_plugins_config(&state(), ProjectParams { project_path: dir.path().into() })
            .unwrap_err();
        assert_eq!(err.code(), "E1400");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn plugin_code_is_written_and_backed_up() {
        let dir = fixture_project();
        let params = |code: &str| WritePluginCodeParams {
            project_path: dir.path().into(),
            filename: "Greeter.js".into(),
            code: code.into(),
        };
        let out = write_plugin_code(&state(), params("// first")).unwrap();
        assert_eq!(out.message, "Successfully wrote plugin Greeter.js");
        write_plugin_code(&state(), params("// second")).unwrap();

        let path = paths::plugins_dir(dir.path()).join("Greeter.js");
        assert_eq!(fs::read_to_string(&path).unwrap(), "// second");
        assert_eq!(backup::list_backups(&path).unwrap().len(), 1);

        let err = write_plugin_code(
            &state(),
            WritePluginCodeParams {
                project_path: dir.path().into(),
                filename: "Greeter.json".into(),
                code: String::new(),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
