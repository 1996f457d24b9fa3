//! General (non-CRD) risk classification (§4.4.1).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value as Json;

use crate::diff::{ChangeType, FieldChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Safe,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAnnotation {
    pub level: RiskLevel,
    pub rule: &'static str,
    pub message: String,
    pub path: String,
}

type Predicate = fn(&FieldChange) -> bool;

struct Rule {
    id: &'static str,
    level: RiskLevel,
    path: &'static Lazy<Regex>,
    predicate: Option<Predicate>,
    message: fn(&FieldChange) -> String,
}

static SELECTOR_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^spec\.selector(\.|$|\[)").unwrap());
static REPLICAS_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^spec\.replicas$").unwrap());
static DATA_KEY_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^data\.[^\[]+$").unwrap());
static IMAGE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.containers\[\d+\]\.image$").unwrap());
static RESOURCE_LIMIT_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.resources\.(requests|limits)\.(cpu|memory)$").unwrap());
static ENV_VAR_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.env\[\d+\]$").unwrap());
static STRATEGY_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^spec\.strategy\.").unwrap());
static METADATA_FIELD_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^metadata\.(annotations|labels)\.").unwrap());
static CATCH_ALL_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r".").unwrap());

fn is_service_pvc_ingress_removed(change: &FieldChange) -> bool {
    change.change_type == ChangeType::ItemRemoved
        && (change.path == "spec.ports" || change.path.starts_with("spec.ports["))
}

fn is_deletion(change: &FieldChange) -> bool {
    change.change_type == ChangeType::ItemRemoved
}

fn is_scale_to_zero(change: &FieldChange) -> bool {
    change.change_type == ChangeType::ValueChanged
        && change.new_value.as_ref().and_then(Json::as_i64) == Some(0)
}

fn is_replica_increase(change: &FieldChange) -> bool {
    match (
        change.old_value.as_ref().and_then(Json::as_i64),
        change.new_value.as_ref().and_then(Json::as_i64),
    ) {
        (Some(old), Some(new)) => new > old,
        _ => false,
    }
}

/// Rules in priority order: first match wins. A change that matches no rule
/// gets no annotation (SAFE by omission, per §4.4.1).
static RULES: &[Rule] = &[
    Rule {
        id: "selector_changed",
        level: RiskLevel::Danger,
        path: &SELECTOR_PATH,
        predicate: None,
        message: |c| format!("selector field `{}` changed on a workload controller", c.path),
    },
    Rule {
        id: "data_key_removed",
        level: RiskLevel::Danger,
        path: &DATA_KEY_PATH,
        predicate: Some(is_deletion),
        message: |c| format!("ConfigMap/Secret data key `{}` removed", c.path),
    },
    Rule {
        id: "service_port_removed",
        level: RiskLevel::Danger,
        path: &CATCH_ALL_PATH,
        predicate: Some(is_service_pvc_ingress_removed),
        message: |c| format!("Service port `{}` removed", c.path),
    },
    Rule {
        id: "replicas_scaled_to_zero",
        level: RiskLevel::Danger,
        path: &REPLICAS_PATH,
        predicate: Some(is_scale_to_zero),
        message: |_| "replicas scaled to 0".to_string(),
    },
    Rule {
        id: "replicas_increased",
        level: RiskLevel::Safe,
        path: &REPLICAS_PATH,
        predicate: Some(is_replica_increase),
        message: |c| format!("replicas increased from {:?} to {:?}", c.old_value, c.new_value),
    },
    Rule {
        id: "image_tag_changed",
        level: RiskLevel::Warning,
        path: &IMAGE_PATH,
        predicate: None,
        message: |c| format!("container image changed at `{}`", c.path),
    },
    Rule {
        id: "resource_limit_changed",
        level: RiskLevel::Warning,
        path: &RESOURCE_LIMIT_PATH,
        predicate: None,
        message: |c| format!("resource request/limit `{}` changed", c.path),
    },
    Rule {
        id: "env_var_added",
        level: RiskLevel::Warning,
        path: &ENV_VAR_PATH,
        predicate: Some(|c| c.change_type == ChangeType::ItemAdded),
        message: |c| format!("new environment variable at `{}`", c.path),
    },
    Rule {
        id: "rolling_strategy_changed",
        level: RiskLevel::Warning,
        path: &STRATEGY_PATH,
        predicate: None,
        message: |c| format!("rollout strategy `{}` changed", c.path),
    },
    Rule {
        id: "metadata_field_added",
        level: RiskLevel::Safe,
        path: &METADATA_FIELD_PATH,
        predicate: Some(|c| !SELECTOR_PATH.is_match(&c.path)),
        message: |c| format!("metadata field `{}` touched", c.path),
    },
];

/// Score one change against the ordered rule table. `None` means the change
/// carries no risk annotation (implicitly SAFE).
pub fn classify(change: &FieldChange) -> Option<RiskAnnotation> {
    for rule in RULES {
        if !rule.path.is_match(&change.path) {
            continue;
        }
        if let Some(pred) = rule.predicate {
            if !pred(change) {
                continue;
            }
        }
        return Some(RiskAnnotation {
            level: rule.level,
            rule: rule.id,
            message: (rule.message)(change),
            path: change.path.clone(),
        });
    }
    None
}

/// Classify every change in a slice, dropping those with no annotation.
pub fn classify_all(changes: &[FieldChange]) -> Vec<RiskAnnotation> {
    changes.iter().filter_map(classify).collect()
}

const DANGEROUS_TO_DELETE: &[&str] = &["Service", "Ingress", "PersistentVolumeClaim"];

/// Whole-resource risk for a `removed` pair: deleting a Service, Ingress or
/// PVC is DANGER even though a removed resource carries no `FieldChange`s to
/// walk (§4.4.1's deletion rule family).
pub fn removal_risk(kind: &str, resource_path: &str) -> Option<RiskAnnotation> {
    if DANGEROUS_TO_DELETE.contains(&kind) {
        Some(RiskAnnotation {
            level: RiskLevel::Danger,
            rule: "resource_deleted",
            message: format!("{kind} `{resource_path}` will be deleted"),
            path: resource_path.to_string(),
        })
    } else {
        None
    }
}

/// Highest level across a set of annotations, `SAFE` if the set is empty.
pub fn max_risk(annotations: &[RiskAnnotation]) -> RiskLevel {
    annotations
        .iter()
        .map(|a| a.level)
        .max()
        .unwrap_or(RiskLevel::Safe)
}
