use serde_json::Value;

use crate::error::{GenerationError, Result};

/// Parses structured output, falling back to the outermost `{...}` span when
/// the model wrapped the JSON in prose or code fences.
pub fn parse_structured_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }
    let span = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => return Err(GenerationError::UnparsableResponse),
    };
    serde_json::from_str::<Value>(span).map_err(|_| GenerationError::UnparsableResponse)
}

/// Non-blank, trimmed strings of the array at `field`.
///
/// A single string is accepted too and split on whitespace, which is how
/// hashtags occasionally come back.
pub fn string_list(value: &Value, field: &str) -> Vec<String> {
    match value.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(joined)) => joined.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

pub fn string_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
