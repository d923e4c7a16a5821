use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::mz::codes;

/// One opcode + indent + parameter tuple.
///
/// Parameters are heterogeneous (strings, numbers, arrays, move-route objects)
/// and are kept as raw JSON values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventCommand {
    pub code: u32,
    pub indent: u32,
    #[serde(default)]
    pub parameters: Vec<Value>,
}

impl EventCommand {
    pub fn new(code: u32, indent: u32, parameters: Vec<Value>) -> Self {
        Self {
            code,
            indent,
            parameters,
        }
    }

    /// A command with no parameters.
    pub fn bare(code: u32, indent: u32) -> Self {
        Self::new(code, indent, Vec::new())
    }

    /// The `0` that ends a page list or block body.
    pub fn terminator(indent: u32) -> Self {
        Self::bare(codes::END, indent)
    }

    pub fn is_terminator(&self) -> bool {
        self.code == codes::END
    }

    pub fn param(&self, index: usize) -> Option<&Value> {
        self.parameters.get(index)
    }

    /// Validate a caller-supplied command object.
    ///
    /// `code` and `indent` must be non-negative integers and `parameters` an
    /// array. The catalog is not consulted: any opcode is accepted.
    pub fn from_value(value: &Value) -> Result<Self, AppError> {
        let obj = value
            .as_object()
            .ok_or_else(|| AppError::invalid("newCommand", "must be an object"))?;

        let field_u32 = |key: &str| -> Result<u32, AppError> {
            let raw = obj
                .get(key)
                .ok_or_else(|| AppError::invalid("newCommand", format!("{key}: required")))?;
            raw.as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    AppError::invalid(
                        "newCommand",
                        format!("{key}: expected a non-negative integer, got {raw}"),
                    )
                })
        };
        let code = field_u32("code")?;
        let indent = field_u32("indent")?;

        let parameters = match obj.get("parameters") {
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(AppError::invalid(
                    "newCommand",
                    format!("parameters: expected an array, got {other}"),
                ))
            }
            None => return Err(AppError::invalid("newCommand", "parameters: required")),
        };

        Ok(Self::new(code, indent, parameters))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_in_mz_key_order() {
        let cmd = EventCommand::new(401, 0, vec![json!("Hello")]);
        assert_eq!(
            serde_json::to_string(&cmd).unwrap(),
            r#"{"code":401,"indent":0,"parameters":["Hello"]}"#
        );
    }

    #[test]
    fn from_value_accepts_any_opcode() {
        let cmd = EventCommand::from_value(&json!({"code": 9999, "indent": 2, "parameters": [{"a": 1}]}))
            .unwrap();
        assert_eq!(cmd.code, 9999);
        assert_eq!(cmd.indent, 2);
    }

    #[test]
    fn from_value_rejects_bad_shapes() {
        for bad in [
            json!("nope"),
            json!({"code": -1, "indent": 0, "parameters": []}),
            json!({"code": 1.5, "indent": 0, "parameters": []}),
            json!({"code": 101, "indent": -2, "parameters": []}),
            json!({"code": 101, "indent": 0, "parameters": "x"}),
            json!({"code": 101, "indent": 0}),
            json!({"indent": 0, "parameters": []}),
        ] {
            let err = EventCommand::from_value(&bad).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput { .. }), "{bad}");
        }
    }
}
