//! Entity selection from piped JSON.
//!
//! Accepts either an object (keys are the entities, values are ignored,
//! so the output of one command can feed the next) or an array of keys.

use crate::error::{ScrapeError, ScrapeResult};
use serde_json::Value;

/// Entity keys from a JSON document, in document order.
pub fn parse_entity_keys(text: &str) -> ScrapeResult<Vec<String>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ScrapeError::Validation(format!("input is not valid JSON: {e}")))?;

    match value {
        Value::Object(map) => Ok(map.into_iter().map(|(key, _)| key).collect()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
                Value::Number(n) if n.is_u64() => Ok(n.to_string()),
                other => Err(ScrapeError::Validation(format!(
                    "entity key must be a string or id, got {other}"
                ))),
            })
            .collect(),
        other => Err(ScrapeError::Validation(format!(
            "expected an object or an array of entity keys, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
