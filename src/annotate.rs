use serde::Serialize;
use serde_json::Value;

use crate::mz::codes;
use crate::mz::EventCommand;

/// A command plus its human-readable description, as returned by
/// `get_event_page`. Serializes as the command's own fields with an extra
/// `_description` key.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedCommand {
    #[serde(flatten)]
    pub command: EventCommand,
    #[serde(rename = "_description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Render a parameter the way a string template would: strings bare, arrays
/// comma-joined, a missing value as `undefined`.
fn show(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => show(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
        Some(other) => other.to_string(),
    }
}

fn show_json(value: Option<&Value>) -> String {
    value.map_or_else(|| "undefined".to_string(), Value::to_string)
}

/// Short description of a command, or `None` for opcodes without a template.
pub fn describe(cmd: &EventCommand) -> Option<String> {
    let p = |i: usize| show(cmd.param(i));
    let text = match cmd.code {
        codes::SHOW_TEXT => format!("Show Text: Face={}({})", p(0), p(1)),
        codes::TEXT_LINE => format!("Text: {}", p(0)),
        codes::SHOW_CHOICES => format!("Show Choices: {}", show_json(cmd.param(0))),
        codes::WHEN => format!("When: [{}]", p(1)),
        codes::WHEN_CANCEL => "When Cancel".to_string(),
        codes::CONTROL_SWITCHES => {
            let on = cmd.param(2).and_then(Value::as_i64) == Some(0);
            format!("Control Switches: {}-{} = {}", p(0), p(1), if on { "ON" } else { "OFF" })
        }
        codes::CONTROL_VARIABLES => format!("Control Variables: {}-{} = {}", p(0), p(1), p(3)),
        codes::SHOW_PICTURE => format!("Show Picture: #{} {}", p(0), p(1)),
        codes::TRANSFER_PLAYER => format!("Transfer Player: Map {} ({},{})", p(1), p(2), p(3)),
        codes::LOOP => "Loop".to_string(),
        codes::REPEAT_ABOVE => "Repeat Above".to_string(),
        codes::BREAK_LOOP => "Break Loop".to_string(),
        codes::CONDITIONAL_BRANCH => format!(
            "Conditional Branch: Code={} A={} Op={} B={}",
            p(0),
            p(1),
            p(2),
            p(3)
        ),
        codes::ELSE => "Else".to_string(),
        codes::BRANCH_END => "Branch End".to_string(),
        _ => return None,
    };
    Some(text)
}

pub fn annotate(cmd: &EventCommand) -> AnnotatedCommand {
    AnnotatedCommand {
        command: cmd.clone(),
        description: describe(cmd),
    }
}

pub fn annotate_list(list: &[EventCommand]) -> Vec<AnnotatedCommand> {
    list.iter().map(annotate).collect()
}

/// Indented plain-text listing of a page, one line per command:
/// `3 |   Text: Hello`. Commands without a template fall back to the
/// catalog name, then to the bare opcode.
pub fn describe_page(list: &[EventCommand]) -> String {
    let width = list.len().saturating_sub(1).to_string().len();
    list.iter()
        .enumerate()
        .map(|(i, cmd)| {
            let label = describe(cmd)
                .or_else(|| codes::catalog_entry(cmd.code).map(|e| e.name.to_string()))
                .unwrap_or_else(|| format!("Code {}", cmd.code));
            let pad = "  ".repeat(usize::try_from(cmd.indent).unwrap_or(0));
            format!("{i:>width$} | {pad}{label}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cmd(code: u32, params: Value) -> EventCommand {
        let parameters = params.as_array().cloned().unwrap_or_default();
        EventCommand::new(code, 0, parameters)
    }

    #[test]
    fn templates() {
        let cases = [
            (cmd(101, json!(["Actor1", 2, 0, 2])), "Show Text: Face=Actor1(2)"),
            (cmd(401, json!(["Hello"])), "Text: Hello"),
            (cmd(102, json!([["Yes", "No"], -1])), r#"Show Choices: ["Yes","No"]"#),
            (cmd(402, json!([0, "Yes"])), "When: [Yes]"),
            (cmd(403, json!([])), "When Cancel"),
            (cmd(121, json!([1, 3, 0])), "Control Switches: 1-3 = ON"),
            (cmd(121, json!([1, 3, 1])), "Control Switches: 1-3 = OFF"),
            (cmd(122, json!([5, 5, 0, 0, 10])), "Control Variables: 5-5 = 0"),
            (cmd(231, json!([1, "Sky", 0, 0, 0, 100, 100, 255, 0])), "Show Picture: #1 Sky"),
            (cmd(201, json!([0, 2, 10, 7, 2, 0])), "Transfer Player: Map 2 (10,7)"),
            (cmd(112, json!([])), "Loop"),
            (cmd(413, json!([])), "Repeat Above"),
            (cmd(113, json!([])), "Break Loop"),
            (cmd(111, json!([1, 4, 0, 10, 0])), "Conditional Branch: Code=1 A=4 Op=0 B=10"),
            (cmd(411, json!([])), "Else"),
            (cmd(412, json!([])), "Branch End"),
        ];
        for (c, expected) in cases {
            assert_eq!(describe(&c).as_deref(), Some(expected));
        }
    }

    #[test]
    fn missing_parameters_render_undefined() {
        assert_eq!(describe(&cmd(101, json!([]))).unwrap(), "Show Text: Face=undefined(undefined)");
        assert_eq!(describe(&cmd(102, json!([]))).unwrap(), "Show Choices: undefined");
    }

    #[test]
    fn unknown_opcode_has_no_description() {
        let a = annotate(&cmd(9999, json!([1])));
        assert!(a.description.is_none());
        let v = serde_json::to_value(&a).unwrap();
        assert!(v.get("_description").is_none());
        assert_eq!(v["code"], 9999);
    }

    #[test]
    fn annotation_serializes_flat() {
        let v = serde_json::to_value(annotate(&cmd(401, json!(["Hi"])))).unwrap();
        assert_eq!(
            v,
            json!({"code": 401, "indent": 0, "parameters": ["Hi"], "_description": "Text: Hi"})
        );
    }

    #[test]
    fn page_listing_indents_bodies() {
        let list = vec![
            EventCommand::bare(112, 0),
            EventCommand::bare(113, 1),
            EventCommand::bare(413, 0),
            EventCommand::bare(230, 0),
            EventCommand::terminator(0),
        ];
        let text = describe_page(&list);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.first().copied(), Some("0 | Loop"));
        assert_eq!(lines.get(1).copied(), Some("1 |   Break Loop"));
        assert_eq!(lines.get(3).copied(), Some("3 | Wait"));
        assert_eq!(lines.get(4).copied(), Some("4 | End"));
    }
}
