//! Graduated per-path risk classification for CRD field changes (§4.5.3).
//!
//! A separate, deeper rule table from [`crate::risk`]: CRD schema changes can
//! silently break every stored object of that type, so the rule set is finer
//! grained and, unlike the general classifier, total — every [`FieldChange`]
//! gets exactly one annotation, falling through to `crd_unknown_change` when
//! nothing more specific matches.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diff::{ChangeType, FieldChange};
use crate::risk::{RiskAnnotation, RiskLevel};

type Predicate = fn(&FieldChange) -> bool;

struct Rule {
    id: &'static str,
    level: RiskLevel,
    path: &'static Lazy<Regex>,
    predicate: Option<Predicate>,
    message: fn(&FieldChange) -> String,
}

fn is_added(c: &FieldChange) -> bool {
    c.change_type == ChangeType::ItemAdded
}

fn is_removed(c: &FieldChange) -> bool {
    c.change_type == ChangeType::ItemRemoved
}

fn is_value_changed(c: &FieldChange) -> bool {
    c.change_type == ChangeType::ValueChanged
}

fn is_optional_property_added(c: &FieldChange) -> bool {
    is_added(c) && !c.path.contains(".required")
}

static METADATA_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^metadata\.(annotations|labels)\.").unwrap());
static PRINTER_COLUMNS_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"spec\.versions\[\d+\]\.additionalPrinterColumns").unwrap());
static VERSION_ENTRY_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^spec\.versions\[\d+\]$").unwrap());
static NESTED_OPTIONAL_PROPERTY_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"properties\.\w+\.properties\.\w+").unwrap());
static SCHEMA_REQUIRED_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"schema\..*\.required").unwrap());
static PROPERTY_REMOVED_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"properties\.\w+$").unwrap());
static PROPERTY_TYPE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"properties\.\w+\.type$").unwrap());
static SCOPE_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^spec\.scope$").unwrap());
static CONVERSION_STRATEGY_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^spec\.conversion\.strategy$").unwrap());
static PROPERTY_DEFAULT_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"properties\.\w+\.default$").unwrap());
static PROPERTY_PATTERN_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"properties\.\w+\.pattern$").unwrap());
static PROPERTY_RANGE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"properties\.\w+\.(minimum|maximum)$").unwrap());
static PROPERTY_ENUM_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"properties\.\w+\.enum").unwrap());
static CONVERSION_WEBHOOK_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^spec\.conversion\.webhook\.").unwrap());
static REQUIRED_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.required").unwrap());
static CATCH_ALL_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r".").unwrap());

/// Rule order is load-bearing (§4.5.3): rules 5 and 7 both match
/// `item_removed`, but version-removal (5) is tried before bare
/// property-removal (7).
static RULES: &[Rule] = &[
    Rule {
        id: "crd_metadata_change",
        level: RiskLevel::Safe,
        path: &METADATA_PATH,
        predicate: None,
        message: |c| format!("metadata field `{}` touched", c.path),
    },
    Rule {
        id: "crd_printer_columns",
        level: RiskLevel::Safe,
        path: &PRINTER_COLUMNS_PATH,
        predicate: None,
        message: |c| format!("printer column `{}` changed", c.path),
    },
    Rule {
        id: "crd_version_added",
        level: RiskLevel::Safe,
        path: &VERSION_ENTRY_PATH,
        predicate: Some(is_added),
        message: |c| format!("new served version at `{}`", c.path),
    },
    Rule {
        id: "crd_optional_property_added",
        level: RiskLevel::Safe,
        path: &NESTED_OPTIONAL_PROPERTY_PATH,
        predicate: Some(is_optional_property_added),
        message: |c| format!("optional field added at `{}`", c.path),
    },
    Rule {
        id: "crd_version_removed",
        level: RiskLevel::Danger,
        path: &VERSION_ENTRY_PATH,
        predicate: Some(is_removed),
        message: |c| format!("served version removed at `{}`", c.path),
    },
    Rule {
        id: "crd_required_field_added",
        level: RiskLevel::Danger,
        path: &SCHEMA_REQUIRED_PATH,
        predicate: Some(is_added),
        message: |c| format!("new required field at `{}`", c.path),
    },
    Rule {
        id: "crd_property_removed",
        level: RiskLevel::Danger,
        path: &PROPERTY_REMOVED_PATH,
        predicate: Some(is_removed),
        message: |c| format!("field `{}` removed from schema", c.path),
    },
    Rule {
        id: "crd_type_changed",
        level: RiskLevel::Danger,
        path: &PROPERTY_TYPE_PATH,
        predicate: Some(is_value_changed),
        message: |c| format!("field type changed at `{}`", c.path),
    },
    Rule {
        id: "crd_scope_changed",
        level: RiskLevel::Danger,
        path: &SCOPE_PATH,
        predicate: Some(is_value_changed),
        message: |_| "scope changed between Namespaced and Cluster".to_string(),
    },
    Rule {
        id: "crd_conversion_strategy_changed",
        level: RiskLevel::Danger,
        path: &CONVERSION_STRATEGY_PATH,
        predicate: Some(is_value_changed),
        message: |_| "conversion strategy changed".to_string(),
    },
    Rule {
        id: "crd_default_changed",
        level: RiskLevel::Warning,
        path: &PROPERTY_DEFAULT_PATH,
        predicate: Some(is_value_changed),
        message: |c| format!("default value changed at `{}`", c.path),
    },
    Rule {
        id: "crd_pattern_changed",
        level: RiskLevel::Warning,
        path: &PROPERTY_PATTERN_PATH,
        predicate: Some(is_value_changed),
        message: |c| format!("validation pattern changed at `{}`", c.path),
    },
    Rule {
        id: "crd_range_changed",
        level: RiskLevel::Warning,
        path: &PROPERTY_RANGE_PATH,
        predicate: Some(is_value_changed),
        message: |c| format!("numeric range changed at `{}`", c.path),
    },
    Rule {
        id: "crd_enum_changed",
        level: RiskLevel::Warning,
        path: &PROPERTY_ENUM_PATH,
        predicate: None,
        message: |c| format!("enum values changed at `{}`", c.path),
    },
    Rule {
        id: "crd_webhook_changed",
        level: RiskLevel::Warning,
        path: &CONVERSION_WEBHOOK_PATH,
        predicate: None,
        message: |c| format!("conversion webhook config changed at `{}`", c.path),
    },
    Rule {
        id: "crd_required_field_removed",
        level: RiskLevel::Safe,
        path: &REQUIRED_PATH,
        predicate: Some(is_removed),
        message: |c| format!("required constraint relaxed at `{}`", c.path),
    },
    Rule {
        id: "crd_required_changed",
        level: RiskLevel::Danger,
        path: &REQUIRED_PATH,
        predicate: Some(is_value_changed),
        message: |c| format!("required field list changed at `{}`", c.path),
    },
    Rule {
        id: "crd_unknown_change",
        level: RiskLevel::Warning,
        path: &CATCH_ALL_PATH,
        predicate: None,
        message: |c| format!("unclassified CRD change at `{}`", c.path),
    },
];

/// Classify one CRD field change. Total: the catch-all rule guarantees a
/// result for every input.
pub fn classify_crd_change(change: &FieldChange) -> RiskAnnotation {
    for rule in RULES {
        if !rule.path.is_match(&change.path) {
            continue;
        }
        if let Some(pred) = rule.predicate {
            if !pred(change) {
                continue;
            }
        }
        return RiskAnnotation {
            level: rule.level,
            rule: rule.id,
            message: (rule.message)(change),
            path: change.path.clone(),
        };
    }
    unreachable!("crd_unknown_change is a catch-all and always matches")
}

/// Classify every change in a slice.
pub fn classify_all(changes: &[FieldChange]) -> Vec<RiskAnnotation> {
    changes.iter().map(classify_crd_change).collect()
}
