//! Stdio tool server: newline-delimited JSON-RPC 2.0 on stdin/stdout.
//!
//! One request is handled at a time. Anything written to stdout is a
//! protocol message; logs go to stderr.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::mz::codes;
use crate::paths;
use crate::registry::{catalog, execute};
use crate::state::AppState;

const PROTOCOL_VERSION: &str = "2024-11-05";

pub const COMMAND_REFERENCE_URI: &str = "mz://docs/event_commands";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

fn ok(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn err(id: &Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {}, "resources": {} },
        "serverInfo": { "name": paths::APP_DIR_NAME, "version": env!("CARGO_PKG_VERSION") },
    })
}

fn call_tool(state: &Arc<AppState>, params: &Value) -> Value {
    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let empty = json!({});
    let args = params.get("arguments").filter(|a| !a.is_null()).unwrap_or(&empty);
    match execute::execute_tool_call(state, name, args) {
        Ok(out) => json!({ "content": [{ "type": "text", "text": out.message }] }),
        Err(e) => json!({
            "content": [{ "type": "text", "text": format!("Error: {}", e.to_tool_message()) }],
            "isError": true,
        }),
    }
}

fn list_resources() -> Value {
    json!({
        "resources": [{
            "uri": COMMAND_REFERENCE_URI,
            "name": "Event command reference",
            "description": "Codes, names and structural roles of RPG Maker MZ event commands",
            "mimeType": "application/json",
        }]
    })
}

fn read_resource(id: &Value, params: &Value) -> Value {
    let uri = params.get("uri").and_then(Value::as_str).unwrap_or("");
    if uri != COMMAND_REFERENCE_URI {
        return err(id, INVALID_PARAMS, &format!("unknown resource: {uri}"));
    }
    let text = serde_json::to_string_pretty(&codes::command_reference()).unwrap_or_default();
    ok(
        id,
        json!({ "contents": [{ "uri": uri, "mimeType": "application/json", "text": text }] }),
    )
}

/// Answer one decoded message. Notifications (no `id`) get no reply.
pub fn handle_message(state: &Arc<AppState>, msg: &Value) -> Option<Value> {
    let method = msg.get("method").and_then(Value::as_str).unwrap_or("");
    let id = msg.get("id")?;
    let params = msg.get("params").cloned().unwrap_or(Value::Null);
    tracing::debug!(method, "rpc request");

    let reply = match method {
        "initialize" => ok(id, initialize_result()),
        "ping" => ok(id, json!({})),
        "tools/list" => ok(id, json!({ "tools": catalog::to_json_schema() })),
        "tools/call" => ok(id, call_tool(state, &params)),
        "resources/list" => ok(id, list_resources()),
        "resources/read" => read_resource(id, &params),
        _ => err(id, METHOD_NOT_FOUND, "method not found"),
    };
    Some(reply)
}

/// Answer one raw input line. Undecodable JSON gets a parse error with a
/// null id; blank lines are skipped.
pub fn handle_line(state: &Arc<AppState>, line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(line) {
        Ok(msg) => handle_message(state, &msg),
        Err(e) => {
            tracing::warn!(error = %e, "unparseable request");
            Some(err(&Value::Null, PARSE_ERROR, "parse error"))
        }
    }
}

/// Serve until stdin closes.
pub async fn run(state: Arc<AppState>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    tracing::info!("stdio tool server ready");

    while let Some(line) = lines.next_line().await? {
        let Some(reply) = handle_line(&state, &line) else {
            continue;
        };
        let mut bytes = serde_json::to_vec(&reply).map_err(std::io::Error::other)?;
        bytes.push(b'\n');
        stdout.write_all(&bytes).await?;
        stdout.flush().await?;
    }
    tracing::info!("stdin closed, shutting down");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::store::tests::fixture_project;

    fn state() -> Arc<AppState> {
        let settings = Settings {
            audit_log: false,
            ..Settings::default()
        };
        Arc::new(AppState::new(settings, std::env::temp_dir()))
    }

    #[test]
    fn initialize_and_notifications() {
        let state = state();
        let reply = handle_line(&state, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).unwrap();
        assert_eq!(reply["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert!(handle_line(&state, r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).is_none());
        assert!(handle_line(&state, "   ").is_none());
    }

    #[test]
    fn protocol_errors() {
        let state = state();
        let reply = handle_line(&state, "{not json").unwrap();
        assert_eq!(reply["error"]["code"], PARSE_ERROR);
        assert!(reply["id"].is_null());

        let reply = handle_line(&state, r#"{"jsonrpc":"2.0","id":"a","method":"nope"}"#).unwrap();
        assert_eq!(reply["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(reply["id"], "a");
    }

    #[test]
    fn tools_list_and_resource() {
        let state = state();
        let reply = handle_line(&state, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).unwrap();
        assert_eq!(reply["result"]["tools"].as_array().unwrap().len(), 31);

        let msg = json!({"jsonrpc": "2.0", "id": 3, "method": "resources/read", "params": {"uri": COMMAND_REFERENCE_URI}});
        let reply = handle_message(&state, &msg).unwrap();
        let text = reply["result"]["contents"][0]["text"].as_str().unwrap();
        assert!(serde_json::from_str::<Value>(text).is_ok());
    }

    #[test]
    fn tool_errors_are_results_not_rpc_errors() {
        let state = state();
        let dir = fixture_project();
        let msg = json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
            "name": "get_event_page",
            "arguments": {"projectPath": dir.path(), "mapId": 1, "eventId": 9, "pageIndex": 0}
        }});
        let reply = handle_message(&state, &msg).unwrap();
        assert_eq!(reply["result"]["isError"], true);
        let text = reply["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error: [E1103]"), "{text}");

        let msg = json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {
            "name": "add_break_loop",
            "arguments": {"projectPath": dir.path(), "mapId": 1, "eventId": 1, "pageIndex": 0}
        }});
        let reply = handle_message(&state, &msg).unwrap();
        assert_eq!(reply["result"]["content"][0]["text"], "Successfully added Break Loop command.");
        assert!(reply["result"].get("isError").is_none());
    }
}
