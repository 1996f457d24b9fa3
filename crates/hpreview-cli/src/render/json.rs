//! The `--output json` renderer: one `serde_json::Value` matching the
//! machine-readable schema, emitted with `serde_json::to_writer_pretty`.

use hpreview_core::orchestrate::{AnnotatedChange, DiffOutput};
use serde_json::{json, Value};

pub fn render(output: &DiffOutput) -> Value {
    let changes: Vec<Value> = output.changes.iter().map(change_to_json).collect();

    let safe = count_risk(output, hpreview_core::RiskLevel::Safe) + count_unannotated(output);
    let warning = count_risk(output, hpreview_core::RiskLevel::Warning);
    let danger = count_risk(output, hpreview_core::RiskLevel::Danger);

    let mut doc = json!({
        "summary": {
            "added": output.summary.added,
            "removed": output.summary.removed,
            "changed": output.summary.changed,
            "unchanged": output.summary.unchanged,
        },
        "risk_summary": {
            "safe": safe,
            "warning": warning,
            "danger": danger,
        },
        "changes": changes,
    });

    if let Some(report) = &output.crd_report {
        doc["crd_analysis"] = crd_report_to_json(report);
    }

    doc
}

fn change_to_json(change: &AnnotatedChange) -> Value {
    let mut entry = json!({
        "resource": change.record.resource_key,
        "kind": change.record.kind,
        "name": change.record.name,
        "namespace": change.record.namespace,
        "status": change.record.status,
        "risk": change.risk,
    });
    if !change.record.changes.is_empty() {
        entry["fields"] = serde_json::to_value(&change.record.changes).expect("FieldChange serializes");
    }
    if let Some(ownership) = &change.ownership {
        entry["ownership"] = serde_json::to_value(ownership).expect("OwnershipInfo serializes");
    }
    entry
}

fn count_risk(output: &DiffOutput, level: hpreview_core::RiskLevel) -> usize {
    output
        .changes
        .iter()
        .flat_map(|c| &c.risk)
        .filter(|a| a.level == level)
        .count()
}

/// A resource that carries no risk annotation at all is SAFE by omission
/// (§4.4.1) and still counts toward `risk_summary.safe`, not just resources
/// with an explicit SAFE annotation.
fn count_unannotated(output: &DiffOutput) -> usize {
    output.changes.iter().filter(|c| c.risk.is_empty()).count()
}

fn crd_report_to_json(report: &hpreview_core::crd::CrdReport) -> Value {
    let crds: Vec<Value> = report
        .crds
        .iter()
        .map(|crd| {
            let mut entry = json!({
                "name": crd.name,
                "status": crd.status,
                "max_risk": crd.max_risk(),
                "risk_annotations": crd.risk_annotations,
                "changes": crd.changes,
            });
            if !crd.stored_version_warnings.is_empty() {
                entry["stored_version_warnings"] = json!(crd.stored_version_warnings);
            }
            if !crd.schema_validation_errors.is_empty() {
                entry["schema_validation_errors"] = json!(crd.schema_validation_errors);
            }
            if let Some(conflict) = &crd.ownership_conflict {
                entry["ownership_conflict"] = json!(conflict);
            }
            entry
        })
        .collect();

    json!({
        "crds": crds,
        "new_crds": report.new_crds,
        "warnings": report.warnings,
        "policy": report.policy_result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpreview_core::orchestrate::{DiffOptions, DiffSummary};
    use hpreview_core::crd::PolicyMode;
    use hpreview_core::runner::CannedRunner;
    use hpreview_core::orchestrate::run_diff;

    #[test]
    fn resource_key_surfaces_as_resource_field() {
        let old = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  template:\n    spec:\n      containers:\n      - image: nginx:1.20\n";
        let new = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  template:\n    spec:\n      containers:\n      - image: nginx:1.21\n";
        let runner = CannedRunner::new()
            .with_response(&["helm", "get", "manifest", "myrelease", "--namespace", "default"], old)
            .with_response(
                &["helm", "upgrade", "myrelease", "./chart", "--dry-run", "--namespace", "default"],
                new,
            );
        let opts = DiffOptions {
            release: "myrelease",
            chart: "./chart",
            namespace: "default",
            values_files: &[],
            set_values: &[],
            version: None,
            server_side: false,
            show_all: false,
            ignore_paths: Vec::new(),
            kubeconfig: None,
            kube_context: None,
            check_crds: false,
            crd_policy: PolicyMode::Warn,
        };
        let output = run_diff(&runner, &opts).unwrap();
        let doc = render(&output);
        assert_eq!(doc["changes"][0]["resource"], "apps/v1/Deployment/default/web");
        assert_eq!(doc["risk_summary"]["warning"], 1);
        assert!(doc.get("crd_analysis").is_none());
    }

    #[test]
    fn empty_summary_has_zero_counts() {
        let summary = DiffSummary::default();
        assert_eq!(summary.added, 0);
    }

    #[test]
    fn unannotated_change_counts_toward_safe() {
        // `command[0]` matches no risk rule, so this change carries zero
        // annotations and must still land in `risk_summary.safe`.
        let old = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  template:\n    spec:\n      containers:\n      - command:\n        - a\n";
        let new = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  template:\n    spec:\n      containers:\n      - command:\n        - b\n";
        let runner = CannedRunner::new()
            .with_response(&["helm", "get", "manifest", "myrelease", "--namespace", "default"], old)
            .with_response(
                &["helm", "upgrade", "myrelease", "./chart", "--dry-run", "--namespace", "default"],
                new,
            );
        let opts = DiffOptions {
            release: "myrelease",
            chart: "./chart",
            namespace: "default",
            values_files: &[],
            set_values: &[],
            version: None,
            server_side: false,
            show_all: false,
            ignore_paths: Vec::new(),
            kubeconfig: None,
            kube_context: None,
            check_crds: false,
            crd_policy: PolicyMode::Warn,
        };
        let output = run_diff(&runner, &opts).unwrap();
        assert!(output.changes[0].risk.is_empty());
        let doc = render(&output);
        assert_eq!(doc["risk_summary"]["safe"], 1);
        assert_eq!(doc["risk_summary"]["warning"], 0);
    }
}
