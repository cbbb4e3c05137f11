//! Request normalizer: collapses the many shapes an LLM caller sends
//! into one canonical `{name, parameters}` form.
//!
//! Normalization is idempotent - running an already-flat request
//! through again is a no-op.

use std::fmt;

use serde_json::{Map, Value};

use super::types::CanonicalRequest;

/// Fields whose string values are coerced to numbers when they arrive
/// through a `tool_request` wrapper.
const NUMERIC_FIELDS: &[&str] = &["price", "days", "limit", "per_page", "id"];

#[derive(Debug, PartialEq, Eq)]
pub enum NormalizeError {
    /// Neither `name` nor the legacy `tool` field is present.
    MissingName,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MissingName => write!(f, "request does not name a tool"),
        }
    }
}

pub fn normalize(raw: &Value) -> Result<CanonicalRequest, NormalizeError> {
    let obj = raw.as_object().ok_or(NormalizeError::MissingName)?;

    // Legacy callers send `tool` instead of `name`; `name` wins when
    // both are present.
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .or_else(|| obj.get("tool").and_then(Value::as_str))
        .ok_or(NormalizeError::MissingName)?
        .to_string();

    let mut parameters = obj
        .get("parameters")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    merge_json_string_blobs(&mut parameters);
    merge_tool_request(&mut parameters);
    flatten_nested_parameters(&mut parameters);

    Ok(CanonicalRequest { name, parameters })
}

/// A string value that is a serialized JSON object with a recognizable
/// marker token. Parsing failures are swallowed and the value kept.
fn looks_like_json_object(s: &str) -> bool {
    let t = s.trim_start();
    t.starts_with('{') && (t.contains("\"type\"") || t.contains("\"name\""))
}

fn merge_json_string_blobs(params: &mut Map<String, Value>) {
    let blob_keys: Vec<String> = params
        .iter()
        .filter(|(k, v)| {
            k.as_str() != "tool_request"
                && matches!(v, Value::String(s) if looks_like_json_object(s))
        })
        .map(|(k, _)| k.clone())
        .collect();

    for key in blob_keys {
        let blob = match params.get(&key) {
            Some(Value::String(s)) => s.clone(),
            _ => continue,
        };
        let parsed: Map<String, Value> = match serde_json::from_str(&blob) {
            Ok(Value::Object(m)) => m,
            _ => continue, // leave the original value untouched
        };

        // Prefer the blob's own `parameters` object; otherwise take its
        // top-level data fields (name, price, ...) minus the envelope
        // bookkeeping keys.
        let merged: Map<String, Value> = match parsed.get("parameters") {
            Some(Value::Object(inner)) => inner.clone(),
            _ => parsed
                .into_iter()
                .filter(|(k, _)| k != "type" && k != "tool" && k != "parameters")
                .collect(),
        };

        if key == "parameters" {
            params.remove(&key);
        }
        for (k, v) in merged {
            params.entry(k).or_insert(v);
        }
    }
}

fn merge_tool_request(params: &mut Map<String, Value>) {
    let wrapper = match params.get("tool_request") {
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(m)) => m,
            _ => return,
        },
        Some(Value::Object(m)) => m.clone(),
        _ => return,
    };

    let inner = match wrapper.get("parameters") {
        Some(Value::Object(m)) => m.clone(),
        _ => return,
    };

    params.remove("tool_request");
    for (k, v) in inner {
        let v = coerce_numeric(&k, v);
        params.entry(k).or_insert(v);
    }
}

fn coerce_numeric(key: &str, value: Value) -> Value {
    if !NUMERIC_FIELDS.contains(&key) {
        return value;
    }
    if let Value::String(s) = &value {
        let t = s.trim();
        if let Ok(n) = t.parse::<i64>() {
            return Value::from(n);
        }
        if let Ok(f) = t.parse::<f64>() {
            return Value::from(f);
        }
    }
    value
}

/// A nested `parameters` map carrying a `type` key is payload that got
/// double-wrapped, not an envelope; flatten it into the outer map.
fn flatten_nested_parameters(params: &mut Map<String, Value>) {
    let inner = match params.get("parameters") {
        Some(Value::Object(m)) if m.contains_key("type") => m.clone(),
        _ => return,
    };
    params.remove("parameters");
    for (k, v) in inner {
        params.entry(k).or_insert(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renormalize(canon: &CanonicalRequest) -> CanonicalRequest {
        normalize(&json!({
            "name": canon.name,
            "parameters": canon.parameters
        }))
        .unwrap()
    }

    #[test]
    fn legacy_tool_field_becomes_name() {
        let canon = normalize(&json!({"tool": "wp_api", "parameters": {"action": "get_posts"}}))
            .unwrap();
        assert_eq!(canon.name, "wp_api");
        assert_eq!(canon.param_str("action"), Some("get_posts"));
    }

    #[test]
    fn missing_name_is_a_shape_error() {
        assert_eq!(
            normalize(&json!({"parameters": {}})).unwrap_err(),
            NormalizeError::MissingName
        );
        assert_eq!(normalize(&json!("nope")).unwrap_err(), NormalizeError::MissingName);
    }

    #[test]
    fn json_string_blob_is_parsed_and_merged() {
        let canon = normalize(&json!({
            "name": "wp_api",
            "parameters": {
                "parameters": "{\"type\":\"membership\",\"parameters\":{\"title\":\"Gold\",\"price\":25}}"
            }
        }))
        .unwrap();
        assert_eq!(canon.param_str("title"), Some("Gold"));
        assert_eq!(canon.parameters["price"], json!(25));
        assert!(!canon.parameters.contains_key("parameters"));
    }

    #[test]
    fn json_string_blob_without_inner_parameters_merges_data_fields() {
        let canon = normalize(&json!({
            "name": "wp_api",
            "parameters": {
                "parameters": "{\"type\":\"product\",\"name\":\"Gold\",\"price\":25}"
            }
        }))
        .unwrap();
        assert_eq!(canon.param_str("name"), Some("Gold"));
        assert_eq!(canon.parameters["price"], json!(25));
    }

    #[test]
    fn malformed_blob_is_left_untouched() {
        let canon = normalize(&json!({
            "name": "wp_api",
            "parameters": {"payload": "{\"type\": not json"}
        }))
        .unwrap();
        assert_eq!(canon.param_str("payload"), Some("{\"type\": not json"));
    }

    #[test]
    fn tool_request_wrapper_merges_with_numeric_coercion() {
        let canon = normalize(&json!({
            "name": "wp_api",
            "parameters": {
                "tool_request": "{\"name\":\"wp_api\",\"parameters\":{\"price\":\"19.99\",\"days\":\"7\",\"title\":\"Gold\"}}"
            }
        }))
        .unwrap();
        assert_eq!(canon.parameters["price"], json!(19.99));
        assert_eq!(canon.parameters["days"], json!(7));
        assert_eq!(canon.param_str("title"), Some("Gold"));
        assert!(!canon.parameters.contains_key("tool_request"));
    }

    #[test]
    fn nested_parameters_with_type_are_flattened() {
        let canon = normalize(&json!({
            "name": "memberpress_info",
            "parameters": {"parameters": {"type": "summary"}}
        }))
        .unwrap();
        assert_eq!(canon.param_str("type"), Some("summary"));
        assert!(!canon.parameters.contains_key("parameters"));
    }

    #[test]
    fn explicit_outer_values_win_over_merged_ones() {
        let canon = normalize(&json!({
            "name": "wp_api",
            "parameters": {
                "title": "Outer",
                "tool_request": "{\"parameters\":{\"title\":\"Inner\"}}"
            }
        }))
        .unwrap();
        assert_eq!(canon.param_str("title"), Some("Outer"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let shapes = vec![
            json!({"tool": "wp_cli", "parameters": {"command": "wp post list"}}),
            json!({"name": "memberpress_info", "parameters": {"parameters": {"type": "all"}}}),
            json!({
                "name": "wp_api",
                "parameters": {
                    "tool_request": "{\"parameters\":{\"price\":\"10\",\"title\":\"T\"}}"
                }
            }),
        ];
        for raw in shapes {
            let once = normalize(&raw).unwrap();
            assert_eq!(renormalize(&once), once);
        }
    }
}
