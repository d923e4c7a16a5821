//! `js/plugins.js`, the plugin manager's list. The file is a script
//! assignment, `var $plugins = [...];`, whose right-hand side is plain JSON
//! with one plugin object per line.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const HEADER: &str = "// Generated by RPG Maker.\n// Do not edit this file directly.\n";
const VARIABLE: &str = "$plugins";

/// One plugin manager row. Parameter values are strings in editor-written
/// files but are kept as arbitrary JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PluginEntry {
    /// Plugin file name without `.js`.
    pub name: String,
    /// Whether the plugin is enabled.
    pub status: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Extract the plugin list from the text of `plugins.js`.
pub fn parse(text: &str) -> Result<Vec<PluginEntry>, String> {
    let after_name = text
        .find(VARIABLE)
        .and_then(|at| text.get(at + VARIABLE.len()..))
        .ok_or_else(|| format!("no `{VARIABLE}` assignment"))?;
    let body = after_name
        .trim_start()
        .strip_prefix('=')
        .ok_or_else(|| format!("`{VARIABLE}` is not followed by `=`"))?
        .trim();
    let body = body.strip_suffix(';').unwrap_or(body);
    serde_json::from_str(body).map_err(|e| e.to_string())
}

/// Render the list the way the MZ editor writes it.
pub fn render(plugins: &[PluginEntry]) -> Result<String, serde_json::Error> {
    let rows = plugins
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    let mut out = format!("{HEADER}var {VARIABLE} =\n[\n");
    if !rows.is_empty() {
        out.push_str(&rows.join(",\n"));
        out.push('\n');
    }
    out.push_str("];\n");
    Ok(out)
}
