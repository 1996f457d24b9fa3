//! Semantic equality over parsed YAML/JSON trees (§4.3.3).
//!
//! Structural `==` is too strict for manifests: `"3"` and `3` are the same
//! value to the API server, `"1000m"` and `"1"` are the same CPU quantity,
//! and an absent `env:` key means the same thing as `env: []`. This module
//! is the single place that knows all three equivalences, so `diff.rs` never
//! has to re-derive them.

use serde_json::Value as Json;

use crate::filters::canonicalize_quantity;

/// Are two present values semantically equal?
pub fn semantic_eq(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Object(ma), Json::Object(mb)) => {
            let mut keys: Vec<&String> = ma.keys().chain(mb.keys()).collect();
            keys.sort();
            keys.dedup();
            keys.iter().all(|k| semantic_eq_opt(ma.get(*k), mb.get(*k)))
        }
        (Json::Array(va), Json::Array(vb)) => {
            va.len() == vb.len() && va.iter().zip(vb).all(|(x, y)| semantic_eq(x, y))
        }
        (Json::String(sa), Json::String(sb)) => {
            sa == sb || quantities_equal(sa, sb)
        }
        (Json::Number(na), Json::String(sb)) | (Json::String(sb), Json::Number(na)) => {
            numeric_string_matches(na, sb)
        }
        (Json::Number(na), Json::Number(nb)) => na == nb || na.as_f64() == nb.as_f64(),
        (Json::Bool(a), Json::Bool(b)) => a == b,
        (Json::Null, Json::Null) => true,
        _ => a == b,
    }
}

/// Are two *optional* values semantically equal, where a missing key is
/// equivalent to an empty sequence, an empty mapping, or `null`?
pub fn semantic_eq_opt(a: Option<&Json>, b: Option<&Json>) -> bool {
    match (a, b) {
        (None, None) => true,
        (None, Some(v)) | (Some(v), None) => is_empty_ish(v),
        (Some(a), Some(b)) => semantic_eq(a, b),
    }
}

fn is_empty_ish(v: &Json) -> bool {
    match v {
        Json::Array(items) => items.is_empty(),
        Json::Object(map) => map.is_empty(),
        Json::Null => true,
        _ => false,
    }
}

fn numeric_string_matches(n: &serde_json::Number, s: &str) -> bool {
    match s.trim().parse::<f64>() {
        Ok(parsed) => n.as_f64() == Some(parsed),
        Err(_) => false,
    }
}

fn quantities_equal(a: &str, b: &str) -> bool {
    match (canonicalize_quantity(a), canonicalize_quantity(b)) {
        (Some(ca), Some(cb)) => ca == cb,
        _ => false,
    }
}
