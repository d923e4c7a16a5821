#![allow(clippy::needless_pass_by_value)]

use schemars::schema_for;
use serde::Serialize;
use serde_json::Value;

use super::{CommandCategory, CommandInfo};
use crate::error::AppError;

/// A registry entry: metadata + JSON schema for the params.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRegistryEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub category: CommandCategory,
    pub mutating: bool,
    pub param_schema: Value,
}

pub(super) fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

pub(super) fn schema_value<T: schemars::JsonSchema>() -> Value {
    let root = schema_for!(T);
    serde_json::to_value(root).unwrap_or_else(|_| empty_object_schema())
}

pub(super) fn entry(info: CommandInfo, param_schema: Value) -> CommandRegistryEntry {
    CommandRegistryEntry {
        name: info.name,
        description: info.description,
        category: info.category,
        mutating: info.mutating,
        param_schema,
    }
}

pub(super) fn de<T: serde::de::DeserializeOwned>(input: &Value) -> Result<T, AppError> {
    serde_json::from_value(input.clone()).map_err(|e| AppError::invalid("arguments", e.to_string()))
}

/// The complete tool registry, auto-generated from param struct schemas.
pub fn command_registry() -> Vec<CommandRegistryEntry> {
    super::Command::registry_entries()
}

/// Help text for tool discovery.
/// Three tiers: no topic → categories, category → tool list, tool → full schema.
pub fn help_text(topic: Option<&str>) -> String {
    let registry = command_registry();

    match topic {
        None => {
            let mut lines = vec!["Available tool categories:".to_string()];
            for cat in CommandCategory::all() {
                let count = registry.iter().filter(|e| e.category == *cat).count();
                if count > 0 {
                    lines.push(format!("  {} ({count}): {}", cat.slug(), cat.description()));
                }
            }
            lines.push(String::new());
            lines.push("Use help({topic: \"event\"}) to list tools in a category.".to_string());
            lines.push("Use help({topic: \"add_dialogue\"}) for full parameter details.".to_string());
            lines.join("\n")
        }
        Some(topic) => {
            if let Some(entry) = registry.iter().find(|e| e.name == topic) {
                let schema_str = serde_json::to_string_pretty(&entry.param_schema)
                    .unwrap_or_else(|_| "{}".to_string());
                return format!(
                    "{}: {}\nCategory: {} | Writes data: {}\n\nParameters:\n{}",
                    entry.name,
                    entry.description,
                    entry.category.slug(),
                    if entry.mutating { "yes" } else { "no" },
                    schema_str,
                );
            }

            let cat_lower = topic.to_lowercase();
            let matching: Vec<&CommandRegistryEntry> = registry
                .iter()
                .filter(|e| e.category.slug() == cat_lower)
                .collect();

            if matching.is_empty() {
                format!("Unknown topic: \"{topic}\". Use help() to see categories and tools.")
            } else {
                let mut lines = vec![format!("{topic} tools:")];
                for entry in &matching {
                    lines.push(format!("  - {}: {}", entry.name, entry.description));
                }
                lines.push(String::new());
                lines.push("Use help({topic: \"tool_name\"}) for parameter details.".to_string());
                lines.join("\n")
            }
        }
    }
}

/// Tool list in the MCP `tools/list` shape, also served by the HTTP API.
pub fn to_json_schema() -> Value {
    Value::Array(
        command_registry()
            .iter()
            .map(|e| {
                serde_json::json!({
                    "name": e.name,
                    "description": e.description,
                    "inputSchema": e.param_schema,
                })
            })
            .collect(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn every_tool_has_an_object_schema() {
        let registry = command_registry();
        assert_eq!(registry.len(), 31);
        for entry in &registry {
            assert_eq!(entry.param_schema["type"], "object", "{}", entry.name);
        }
        let mut names: Vec<_> = registry.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), registry.len());
    }

    #[test]
    fn page_tools_require_page_address() {
        let registry = command_registry();
        let add = registry.iter().find(|e| e.name == "add_dialogue").unwrap();
        let required = add.param_schema["required"].as_array().unwrap();
        for key in ["projectPath", "mapId", "eventId", "pageIndex", "text"] {
            assert!(required.iter().any(|r| r == key), "missing {key}");
        }
        assert!(add.mutating);
    }

    #[test]
    fn help_tiers() {
        assert!(help_text(None).contains("event ("));
        assert!(help_text(Some("backup")).contains("undo_last_change"));
        assert!(help_text(Some("add_loop")).contains("insertPosition"));
        assert!(help_text(Some("nope")).starts_with("Unknown topic"));
    }

    #[test]
    fn tool_list_shape() {
        let tools = to_json_schema();
        let first = &tools.as_array().unwrap()[0];
        assert!(first["name"].is_string());
        assert!(first["inputSchema"].is_object());
    }
}
