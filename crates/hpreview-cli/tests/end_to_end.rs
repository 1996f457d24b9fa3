//! End-to-end scenarios from the design notes, driven through a canned
//! [`Runner`] rather than a real `helm`/`kubectl` binary — mirrors
//! `sherpack-cli`'s `tests/integration_tests.rs` in spirit (one test per
//! user-visible scenario), adapted to this crate's dependency-injected
//! pipeline instead of spawning `CARGO_BIN_EXE_hpreview`.

use hpreview_core::crd::{run_crd_pipeline, PolicyMode};
use hpreview_core::orchestrate::{run_diff, DiffOptions};
use hpreview_core::resource::parse_multi_doc;
use hpreview_core::runner::CannedRunner;
use hpreview_cli::render;

fn base_opts<'a>() -> DiffOptions<'a> {
    DiffOptions {
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
    }
}

#[test]
fn scenario_1_image_tag_bump() {
    let old = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  template:\n    spec:\n      containers:\n      - image: nginx:1.20\n";
    let new = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  template:\n    spec:\n      containers:\n      - image: nginx:1.21\n";
    let runner = CannedRunner::new()
        .with_response(&["helm", "get", "manifest", "myrelease", "--namespace", "default"], old)
        .with_response(
            &["helm", "upgrade", "myrelease", "./chart", "--dry-run", "--namespace", "default"],
            new,
        );

    let output = run_diff(&runner, &base_opts()).unwrap();

    assert_eq!(output.changes.len(), 1);
    assert_eq!(output.changes[0].record.changes.len(), 1);
    assert_eq!(output.changes[0].record.changes[0].path, "spec.template.spec.containers[0].image");
    assert_eq!(output.changes[0].risk[0].rule, "image_tag_changed");

    let doc = render::json::render(&output);
    assert_eq!(doc["risk_summary"]["warning"], 1);
}

#[test]
fn scenario_2_replica_scale_to_zero() {
    let old = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  replicas: 3\n";
    let new = "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: default\nspec:\n  replicas: 0\n";
    let runner = CannedRunner::new()
        .with_response(&["helm", "get", "manifest", "myrelease", "--namespace", "default"], old)
        .with_response(
            &["helm", "upgrade", "myrelease", "./chart", "--dry-run", "--namespace", "default"],
            new,
        );

    let output = run_diff(&runner, &base_opts()).unwrap();

    assert_eq!(output.changes.len(), 1);
    let risk = &output.changes[0].risk[0];
    assert_eq!(risk.rule, "replicas_scaled_to_zero");
    assert_eq!(risk.level, hpreview_core::RiskLevel::Danger);
}

fn crd_yaml(name: &str, versions: &str, stored_versions: &str, scope: &str) -> String {
    format!(
        "apiVersion: apiextensions.k8s.io/v1\nkind: CustomResourceDefinition\nmetadata:\n  name: {name}\nspec:\n  group: example.com\n  names:\n    plural: widgets\n    kind: Widget\n  scope: {scope}\n  versions:\n{versions}\nstatus:\n  storedVersions:\n{stored_versions}\n"
    )
}

#[test]
fn scenario_3_crd_version_removed_with_stored_objects_blocks_under_fail_policy() {
    let installed = parse_multi_doc(
        &crd_yaml(
            "widgets.example.com",
            "  - name: v2\n    storage: true\n  - name: v1\n    storage: false\n",
            "  - v1\n  - v2\n",
            "Namespaced",
        ),
        "",
    )
    .unwrap()
    .remove(0);
    let proposed = parse_multi_doc(
        &crd_yaml("widgets.example.com", "  - name: v2\n    storage: true\n", "  - v1\n  - v2\n", "Namespaced"),
        "",
    )
    .unwrap()
    .remove(0);

    let runner = CannedRunner::new()
        .with_response(&["kubectl", "get", "crds", "-o", "yaml"], installed.raw.clone())
        .with_failure(&["kubectl", "get", "widgets.example.com", "-A", "-o", "yaml"], "not found");

    let dir = tempfile::tempdir().unwrap();
    let report = run_crd_pipeline(&runner, "myrelease", dir.path(), vec![proposed], PolicyMode::Fail, &[]);

    assert_eq!(report.crds.len(), 1);
    assert!(report.crds[0].risk_annotations.iter().any(|a| a.rule == "crd_version_removed"));
    assert!(report.crds[0].stored_version_warnings.iter().any(|w| w.contains("v1")));
    assert!(report.policy_result.unwrap().blocked);
}

#[test]
fn scenario_4_new_optional_crd_property_is_safe() {
    let schema_without = "  - name: v1\n    storage: true\n    schema:\n      openAPIV3Schema:\n        type: object\n        properties:\n          spec:\n            type: object\n            properties:\n              color:\n                type: string\n";
    let schema_with = "  - name: v1\n    storage: true\n    schema:\n      openAPIV3Schema:\n        type: object\n        properties:\n          spec:\n            type: object\n            properties:\n              color:\n                type: string\n              nickname:\n                type: string\n";

    let installed =
        parse_multi_doc(&crd_yaml("widgets.example.com", schema_without, "  - v1\n", "Namespaced"), "").unwrap().remove(0);
    let proposed =
        parse_multi_doc(&crd_yaml("widgets.example.com", schema_with, "  - v1\n", "Namespaced"), "").unwrap().remove(0);

    let runner = CannedRunner::new()
        .with_response(&["kubectl", "get", "crds", "-o", "yaml"], installed.raw.clone())
        .with_failure(&["kubectl", "get", "widgets.example.com", "-A", "-o", "yaml"], "no instances");

    let dir = tempfile::tempdir().unwrap();
    let report = run_crd_pipeline(&runner, "myrelease", dir.path(), vec![proposed], PolicyMode::Warn, &[]);

    assert_eq!(report.crds.len(), 1);
    assert!(report.crds[0]
        .risk_annotations
        .iter()
        .any(|a| a.rule == "crd_optional_property_added" && a.level == hpreview_core::RiskLevel::Safe));
    assert!(!report.policy_result.unwrap().blocked);
}

#[test]
fn scenario_5_crd_scope_flip_blocks_under_fail_policy() {
    let installed =
        parse_multi_doc(&crd_yaml("widgets.example.com", "  - name: v1\n    storage: true\n", "  - v1\n", "Namespaced"), "")
            .unwrap()
            .remove(0);
    let proposed =
        parse_multi_doc(&crd_yaml("widgets.example.com", "  - name: v1\n    storage: true\n", "  - v1\n", "Cluster"), "")
            .unwrap()
            .remove(0);

    let runner = CannedRunner::new()
        .with_response(&["kubectl", "get", "crds", "-o", "yaml"], installed.raw.clone())
        .with_failure(&["kubectl", "get", "widgets.example.com", "-A", "-o", "yaml"], "no instances");

    let dir = tempfile::tempdir().unwrap();
    let report = run_crd_pipeline(&runner, "myrelease", dir.path(), vec![proposed], PolicyMode::Fail, &[]);

    assert_eq!(report.crds.len(), 1);
    assert!(report.crds[0].risk_annotations.iter().any(|a| a.rule == "crd_scope_changed"));
    assert!(report.policy_result.unwrap().blocked);
}

#[test]
fn scenario_6_live_custom_resource_violates_tightened_schema() {
    let schema_loose = "  - name: v1\n    storage: true\n    schema:\n      openAPIV3Schema:\n        type: object\n        properties:\n          spec:\n            type: object\n            properties:\n              color:\n                type: string\n";
    let schema_strict = "  - name: v1\n    storage: true\n    schema:\n      openAPIV3Schema:\n        type: object\n        properties:\n          spec:\n            type: object\n            required:\n            - color\n            properties:\n              color:\n                type: string\n";

    let installed =
        parse_multi_doc(&crd_yaml("widgets.example.com", schema_loose, "  - v1\n", "Namespaced"), "").unwrap().remove(0);
    let proposed =
        parse_multi_doc(&crd_yaml("widgets.example.com", schema_strict, "  - v1\n", "Namespaced"), "").unwrap().remove(0);

    let live_widget =
        "apiVersion: example.com/v1\nkind: Widget\nmetadata:\n  name: my-widget\n  namespace: default\nspec:\n  size: big\n";

    let runner = CannedRunner::new()
        .with_response(&["kubectl", "get", "crds", "-o", "yaml"], installed.raw.clone())
        .with_response(&["kubectl", "get", "widgets.example.com", "-A", "-o", "yaml"], live_widget);

    let dir = tempfile::tempdir().unwrap();
    let report = run_crd_pipeline(&runner, "myrelease", dir.path(), vec![proposed], PolicyMode::Warn, &[]);

    assert_eq!(report.crds.len(), 1);
    assert_eq!(
        report.crds[0].schema_validation_errors,
        vec!["default/my-widget: At 'spec': missing required field 'color'".to_string()],
    );
}

#[test]
fn check_crds_flag_off_routes_crd_through_general_pipeline_not_dropped() {
    let new = "apiVersion: apiextensions.k8s.io/v1\nkind: CustomResourceDefinition\nmetadata:\n  name: widgets.example.com\nspec:\n  group: example.com\n  names:\n    plural: widgets\n    kind: Widget\n  scope: Namespaced\n  versions:\n  - name: v1\n    storage: true\n";
    let runner = CannedRunner::new()
        .with_response(&["helm", "get", "manifest", "myrelease", "--namespace", "default"], "")
        .with_response(
            &["helm", "upgrade", "myrelease", "./chart", "--dry-run", "--namespace", "default"],
            new,
        );

    let output = run_diff(&runner, &base_opts()).unwrap();

    assert!(output.crd_report.is_none());
    assert_eq!(output.changes.len(), 1);
    assert_eq!(output.changes[0].record.kind, "CustomResourceDefinition");
}
