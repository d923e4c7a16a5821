//! JSONL audit logging for tool executions.
//!
//! Every tool call is logged as a single line in
//! `{config_dir}/tool-logs/YYYY-MM-DD.jsonl`. Best-effort: never panics or
//! fails the caller.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::util::{date_from_epoch, now_ms};

#[derive(Serialize)]
struct ToolAuditEntry<'a> {
    ts: u64,
    tool: &'a str,
    input: &'a Value,
    ok: bool,
    message: &'a str,
    duration_ms: u64,
}

/// Log a single tool execution to today's JSONL audit file.
pub fn log_tool_call(
    config_dir: &Path,
    tool: &str,
    input: &Value,
    result: Result<&str, &str>,
    duration: Duration,
) {
    let now = now_ms() / 1000;

    let (ok, message) = match result {
        Ok(msg) => (true, msg),
        Err(e) => (false, e),
    };

    let entry = ToolAuditEntry {
        ts: now,
        tool,
        input,
        ok,
        message,
        duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
    };

    let dir = crate::paths::tool_logs_dir(config_dir);
    if let Err(e) = fs::create_dir_all(&dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "audit log unavailable");
        return;
    }

    let path = dir.join(format!("{}.jsonl", date_from_epoch(now)));
    let written = serde_json::to_string(&entry)
        .map_err(std::io::Error::from)
        .and_then(|json| {
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            writeln!(file, "{json}")
        });
    if let Err(e) = written {
        tracing::warn!(file = %path.display(), error = %e, "failed to append audit entry");
    }
}
