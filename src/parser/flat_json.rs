use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::parser::context::VariableStore;

pub const DEFAULT_OUTPUT_PREFIX: &str = "json";
pub const EXTRACT_ERROR_VAR: &str = "extract_error";
pub const EXTRACT_EXCEPTION_VAR: &str = "extract_exception";

/// Turn the top-level properties of a flat JSON object into `<prefix>.<property>` variables.
///
/// Strings are stored verbatim, other values as their compact JSON text.
pub fn extract_flat_json(prefix: &str, raw: &str) -> Result<VariableStore> {
    let value: Value = serde_json::from_str(raw)?;
    let obj = value
        .as_object()
        .ok_or_else(|| anyhow!("expected a JSON object, got {}", json_kind(&value)))?;

    let mut vars = VariableStore::new();
    for (property, v) in obj {
        let text = match v {
            Value::String(s) => s.to_owned(),
            other => other.to_string(),
        };
        vars.set(format!("{}.{}", prefix, property), text);
    }
    Ok(vars)
}

/// Like [`extract_flat_json`] but never fails: a bad message is recorded in
/// the `extract_error` / `extract_exception` variables instead.
pub fn extract_into(vars: &mut VariableStore, prefix: &str, raw: &str) {
    match extract_flat_json(prefix, raw) {
        Ok(extracted) => {
            vars.merge(&extracted);
        }
        Err(e) => {
            vars.set(EXTRACT_ERROR_VAR, "bad inbound message");
            vars.set(EXTRACT_EXCEPTION_VAR, e.to_string());
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
