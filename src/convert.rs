//! Tool-argument extraction helpers.
//!
//! Tool callers are LLM agents, and several front-ends serialize structured
//! parameters as JSON-encoded strings instead of native objects or arrays.
//! The helpers here accept both forms transparently; genuinely malformed
//! JSON is an invalid-argument error, never a panic.

use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

/// Get a required string argument.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| McpError::MissingArg(name.to_string()))
}

/// Get an optional string argument.
pub fn get_optional_string(args: &Map<String, JsonValue>, name: &str) -> Option<String> {
    args.get(name).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Get an optional unsigned integer argument.
pub fn get_optional_u64(args: &Map<String, JsonValue>, name: &str) -> Option<u64> {
    args.get(name).and_then(|v| v.as_u64())
}

/// Get an optional boolean argument.
pub fn get_optional_bool(args: &Map<String, JsonValue>, name: &str) -> Option<bool> {
    args.get(name).and_then(|v| v.as_bool())
}

/// Get an optional structured argument that may arrive as a JSON string.
///
/// Absent and `null` both yield `None`. A string value is parsed as JSON;
/// parse failure is an error carrying the parameter name.
pub fn json_param(args: &Map<String, JsonValue>, name: &str) -> Result<Option<JsonValue>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(raw)) => {
            serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| McpError::InvalidArg {
                    name: name.to_string(),
                    reason: format!("invalid JSON: {}", e),
                })
        }
        Some(other) => Ok(Some(other.clone())),
    }
}

/// Get an optional object argument (native or JSON-string encoded).
pub fn object_param(args: &Map<String, JsonValue>, name: &str) -> Result<Option<Map<String, JsonValue>>> {
    match json_param(args, name)? {
        None => Ok(None),
        Some(JsonValue::Object(map)) => Ok(Some(map)),
        Some(other) => Err(McpError::InvalidArg {
            name: name.to_string(),
            reason: format!("expected an object, got {}", other),
        }),
    }
}

/// Get an optional list of strings, tolerating the shapes LLM front-ends
/// produce: a native array, a JSON-encoded array string, or a bare string
/// (treated as a one-item list). Non-string array items are dropped.
pub fn string_list_param(args: &Map<String, JsonValue>, name: &str) -> Result<Option<Vec<String>>> {
    let value = match args.get(name) {
        None | Some(JsonValue::Null) => return Ok(None),
        Some(v) => v,
    };

    match value {
        JsonValue::Array(items) => Ok(Some(collect_strings(items))),
        JsonValue::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.starts_with('[') {
                let parsed: JsonValue =
                    serde_json::from_str(trimmed).map_err(|e| McpError::InvalidArg {
                        name: name.to_string(),
                        reason: format!("invalid JSON: {}", e),
                    })?;
                match parsed {
                    JsonValue::Array(items) => Ok(Some(collect_strings(&items))),
                    other => Err(McpError::InvalidArg {
                        name: name.to_string(),
                        reason: format!("expected a list, got {}", other),
                    }),
                }
            } else if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(vec![trimmed.to_string()]))
            }
        }
        other => Err(McpError::InvalidArg {
            name: name.to_string(),
            reason: format!("expected a list of strings, got {}", other),
        }),
    }
}

fn collect_strings(items: &[JsonValue]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| v.as_str().map(|s| s.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: JsonValue) -> Map<String, JsonValue> {
        match json!({ "param": value }) {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_json_param_passes_native_values_through() {
        let map = args(json!({"certificate_status": "VERIFIED"}));
        let parsed = json_param(&map, "param").unwrap().unwrap();
        assert_eq!(parsed, json!({"certificate_status": "VERIFIED"}));
    }

    #[test]
    fn test_json_param_parses_string_form() {
        let map = args(json!("{\"certificate_status\": \"VERIFIED\"}"));
        let parsed = json_param(&map, "param").unwrap().unwrap();
        assert_eq!(parsed, json!({"certificate_status": "VERIFIED"}));
    }

    #[test]
    fn test_json_param_rejects_malformed_string() {
        let map = args(json!("{bad json"));
        let err = json_param(&map, "param").unwrap_err();
        assert!(matches!(err, McpError::InvalidArg { .. }));
    }

    #[test]
    fn test_json_param_absent_and_null() {
        let map = Map::new();
        assert!(json_param(&map, "param").unwrap().is_none());
        let map = args(JsonValue::Null);
        assert!(json_param(&map, "param").unwrap().is_none());
    }

    #[test]
    fn test_object_param_rejects_non_object() {
        let map = args(json!("[1, 2]"));
        assert!(object_param(&map, "param").is_err());
    }

    #[test]
    fn test_string_list_param_shapes() {
        let map = args(json!(["a", "b"]));
        assert_eq!(
            string_list_param(&map, "param").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );

        let map = args(json!("[\"a\", \"b\"]"));
        assert_eq!(
            string_list_param(&map, "param").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );

        let map = args(json!("solo"));
        assert_eq!(
            string_list_param(&map, "param").unwrap(),
            Some(vec!["solo".to_string()])
        );

        let map = args(json!(7));
        assert!(string_list_param(&map, "param").is_err());
    }
}
