//! Structural diff and the `diff_all` public operation (§4.3.4-4.3.5).

use serde::Serialize;
use serde_json::Value as Json;

use crate::filters::{normalize_body, strip_noise, DEFAULT_NOISE_PATHS};
use crate::pairing::{PairStatus, ResourcePair};
use crate::path::{format_path, Segment};
use crate::semantic::{semantic_eq, semantic_eq_opt};

/// One atomic difference between an old and new resource body.
#[derive(Debug, Clone, Serialize)]
pub struct FieldChange {
    pub path: String,
    pub old_value: Option<Json>,
    pub new_value: Option<Json>,
    pub change_type: ChangeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    ValueChanged,
    TypeChanged,
    ItemAdded,
    ItemRemoved,
}

impl ChangeType {
    /// The `snake_case` name used both in the serialized form and as the
    /// lexicographic sort key for `(path, change_type)` ordering.
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::ValueChanged => "value_changed",
            ChangeType::TypeChanged => "type_changed",
            ChangeType::ItemAdded => "item_added",
            ChangeType::ItemRemoved => "item_removed",
        }
    }
}

/// Per-resource rollup of field-level changes.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeRecord {
    pub resource_key: String,
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub status: String,
    pub changes: Vec<FieldChange>,
}

/// Diff every pair, dropping pairs that turn out semantically unchanged.
///
/// `show_all` disables noise stripping for this call (normalization still
/// runs); `extra_ignores` appends to the noise set for this call only.
pub fn diff_all(pairs: &[ResourcePair], show_all: bool, extra_ignores: &[String]) -> Vec<ChangeRecord> {
    let mut noise_paths: Vec<String> = DEFAULT_NOISE_PATHS.iter().map(|s| s.to_string()).collect();
    noise_paths.extend(extra_ignores.iter().cloned());

    pairs
        .iter()
        .filter_map(|pair| diff_one(pair, show_all, &noise_paths))
        .collect()
}

fn diff_one(pair: &ResourcePair, show_all: bool, noise_paths: &[String]) -> Option<ChangeRecord> {
    let representative = pair
        .new
        .as_ref()
        .or(pair.old.as_ref())
        .expect("a pair always has at least one side");

    match pair.status {
        PairStatus::Added | PairStatus::Removed => Some(ChangeRecord {
            resource_key: representative.key(),
            kind: representative.kind.clone(),
            name: representative.name.clone(),
            namespace: representative.namespace.clone(),
            status: pair.status.as_str().to_string(),
            changes: Vec::new(),
        }),
        PairStatus::Unchanged => None,
        PairStatus::Changed => {
            let old = &pair.old.as_ref().expect("changed pair has old side").body;
            let new = &pair.new.as_ref().expect("changed pair has new side").body;

            let (old, new) = if show_all {
                (old.clone(), new.clone())
            } else {
                (strip_noise(old, noise_paths), strip_noise(new, noise_paths))
            };
            let old = normalize_body(&old);
            let new = normalize_body(&new);

            if semantic_eq(&old, &new) {
                return None;
            }

            let mut changes = Vec::new();
            let mut segments = Vec::new();
            extract_changes(&old, &new, &mut segments, &mut changes);
            sort_changes(&mut changes);

            Some(ChangeRecord {
                resource_key: representative.key(),
                kind: representative.kind.clone(),
                name: representative.name.clone(),
                namespace: representative.namespace.clone(),
                status: pair.status.as_str().to_string(),
                changes,
            })
        }
    }
}

/// Sort changes by `(path, change_type)`, the deterministic order the
/// `FieldChange` contract requires (§4.3.4). Shared by `diff_all` and the
/// CRD differ, which both produce raw `FieldChange` vectors.
pub(crate) fn sort_changes(changes: &mut [FieldChange]) {
    changes.sort_by(|a, b| {
        (a.path.as_str(), a.change_type.as_str()).cmp(&(b.path.as_str(), b.change_type.as_str()))
    });
}

pub(crate) fn extract_changes(old: &Json, new: &Json, segments: &mut Vec<Segment>, out: &mut Vec<FieldChange>) {
    match (old, new) {
        (Json::Object(mo), Json::Object(mn)) => {
            let mut keys: Vec<String> = mo.keys().cloned().collect();
            for k in mn.keys() {
                if !mo.contains_key(k) {
                    keys.push(k.clone());
                }
            }
            for key in keys {
                segments.push(Segment::Key(key.clone()));
                match (mo.get(&key), mn.get(&key)) {
                    (Some(a), Some(b)) => extract_changes(a, b, segments, out),
                    (Some(a), None) => {
                        if !semantic_eq_opt(Some(a), None) {
                            out.push(leaf_change(segments, Some(a.clone()), None, ChangeType::ItemRemoved));
                        }
                    }
                    (None, Some(b)) => {
                        if !semantic_eq_opt(None, Some(b)) {
                            out.push(leaf_change(segments, None, Some(b.clone()), ChangeType::ItemAdded));
                        }
                    }
                    (None, None) => unreachable!("key came from one of the two maps"),
                }
                segments.pop();
            }
        }
        (Json::Array(ao), Json::Array(an)) => {
            for i in 0..ao.len().max(an.len()) {
                segments.push(Segment::Index(i));
                match (ao.get(i), an.get(i)) {
                    (Some(a), Some(b)) => extract_changes(a, b, segments, out),
                    (Some(a), None) => {
                        out.push(leaf_change(segments, Some(a.clone()), None, ChangeType::ItemRemoved))
                    }
                    (None, Some(b)) => {
                        out.push(leaf_change(segments, None, Some(b.clone()), ChangeType::ItemAdded))
                    }
                    (None, None) => unreachable!("index came from one of the two arrays"),
                }
                segments.pop();
            }
        }
        (a, b) => {
            if semantic_eq(a, b) {
                return;
            }
            let change_type = if json_type_name(a) == json_type_name(b) {
                ChangeType::ValueChanged
            } else {
                ChangeType::TypeChanged
            };
            out.push(leaf_change(segments, Some(a.clone()), Some(b.clone()), change_type));
        }
    }
}

fn leaf_change(
    segments: &[Segment],
    old_value: Option<Json>,
    new_value: Option<Json>,
    change_type: ChangeType,
) -> FieldChange {
    FieldChange {
        path: format_path(segments),
        old_value,
        new_value,
        change_type,
    }
}

fn json_type_name(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
