//! Self-contained OpenAPI v3 subset validator for live custom-resource
//! instances against a CRD's storage-version schema (§4.5.7).
//!
//! Deliberately narrow: `oneOf`/`$ref`/`allOf` and the rest of full JSON
//! Schema are not implemented. CRD schemas in the wild routinely violate
//! those corners, and silently guessing at them would diverge from the
//! cluster's own behavior more than it would help.

use regex::Regex;
use serde_json::Value as Json;

const ENVELOPE_KEYS: &[&str] = &["apiVersion", "kind", "metadata", "status"];

/// Validate `value` against `schema`, returning one line per violation
/// (without the `"<namespace>/<name>: "` prefix; callers prepend that).
pub fn validate(schema: &Json, value: &Json) -> Vec<String> {
    let mut errors = Vec::new();
    validate_node(schema, value, "", &mut errors);
    errors
}

fn validate_node(schema: &Json, value: &Json, path: &str, errors: &mut Vec<String>) {
    if value.is_null() {
        return;
    }

    if let Some(t) = schema.get("type").and_then(Json::as_str) {
        if !type_matches(t, value) {
            errors.push(format!("At '{path}': expected type '{t}', got {}", type_name(value)));
            return;
        }
    }

    if let Some(enum_values) = schema.get("enum").and_then(Json::as_array) {
        if !enum_values.contains(value) {
            errors.push(format!("At '{path}': value is not one of the allowed enum values"));
        }
    }

    if let Json::String(s) = value {
        if let Some(pattern) = schema.get("pattern").and_then(Json::as_str) {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    errors.push(format!("At '{path}': does not match pattern '{pattern}'"));
                }
                Ok(_) => {}
                Err(_) => {} // malformed pattern: silently ignored (§4.5.7)
            }
        }
    }

    if let Json::Number(n) = value {
        if let Some(min) = schema.get("minimum").and_then(Json::as_f64) {
            if n.as_f64().is_some_and(|v| v < min) {
                errors.push(format!("At '{path}': value is below minimum {min}"));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(Json::as_f64) {
            if n.as_f64().is_some_and(|v| v > max) {
                errors.push(format!("At '{path}': value exceeds maximum {max}"));
            }
        }
    }

    match value {
        Json::Object(map) => {
            if let Some(required) = schema.get("required").and_then(Json::as_array) {
                for r in required {
                    if let Some(name) = r.as_str() {
                        if !map.contains_key(name) {
                            errors.push(format!("At '{path}': missing required field '{name}'"));
                        }
                    }
                }
            }
            let properties = schema.get("properties").and_then(Json::as_object);
            let additional = schema.get("additionalProperties");
            for (key, child) in map {
                let child_path = join_path(path, key);
                if let Some(prop_schema) = properties.and_then(|p| p.get(key)) {
                    validate_node(prop_schema, child, &child_path, errors);
                    continue;
                }
                match additional {
                    Some(Json::Bool(false)) => {
                        if !ENVELOPE_KEYS.contains(&key.as_str()) {
                            errors.push(format!("At '{path}': additional property '{key}' is not allowed"));
                        }
                    }
                    Some(ap_schema @ Json::Object(_)) => {
                        validate_node(ap_schema, child, &child_path, errors);
                    }
                    _ => {} // missing additionalProperties: permissive
                }
            }
        }
        Json::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter().enumerate() {
                    validate_node(item_schema, item, &format!("{path}[{i}]"), errors);
                }
            }
        }
        _ => {}
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn type_matches(t: &str, v: &Json) -> bool {
    match t {
        "string" => v.is_string(),
        "integer" => v.is_i64() || v.is_u64(),
        "number" => v.is_number(),
        "boolean" => v.is_boolean(),
        "object" => v.is_object(),
        "array" => v.is_array(),
        _ => true,
    }
}

fn type_name(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Format one object's validation errors as `"<namespace>/<name>: At '<path>': <reason>"`.
pub fn format_errors(namespace: &str, name: &str, errors: &[String]) -> Vec<String> {
    errors
        .iter()
        .map(|e| format!("{namespace}/{name}: {e}"))
        .collect()
}
