//! CRD pipeline orchestration (§4.5.9): the fixed sequence that turns a set
//! of proposed CRDs into a [`CrdReport`] — extract, discover, restrict, pair,
//! diff, then per-pair classify/validate/check, finishing with the policy
//! gate. Everything here is pure except the two `Runner` calls (installed
//! CRD discovery and live custom-resource fetch), both degradable: a failure
//! becomes a warning on the report, never a fatal error, per §7.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value as Json;

use super::classifier;
use super::extraction::extract_crds_from_chart_dir;
use super::new_crd::{describe_new_crd, NewCrdInfo};
use super::ownership_conflict::check_ownership_conflict;
use super::pairing::pair_crds_by_name;
use super::policy::{evaluate_policy, PolicyMode, PolicyResult};
use super::report::{CrdChangeDetail, CrdReport};
use super::stored_version::stored_version_warnings;
use super::validator;
use crate::diff::diff_all;
use crate::filters::CRD_EXTRA_NOISE_PATHS;
use crate::pairing::PairStatus;
use crate::resource::{parse_list_or_stream, Resource};
use crate::runner::Runner;

/// Run the full CRD pipeline for one `diff` invocation.
///
/// `manifest_crds` are the `CustomResourceDefinition` resources already
/// pulled out of the rendered proposed manifest by the caller, so they never
/// also appear in the general (non-CRD) diff stream.
pub fn run_crd_pipeline(
    runner: &dyn Runner,
    release: &str,
    chart_path: &Path,
    manifest_crds: Vec<Resource>,
    policy_mode: PolicyMode,
    extra_ignores: &[String],
) -> CrdReport {
    let (dir_crds, mut warnings) = extract_crds_from_chart_dir(chart_path);
    let proposed = merge_by_name(dir_crds, manifest_crds);

    if proposed.is_empty() {
        return CrdReport {
            crds: Vec::new(),
            new_crds: Vec::new(),
            policy_result: Some(evaluate_policy(policy_mode, &[])),
            warnings,
        };
    }

    let (installed, discovery_warnings) = discover_installed(runner);
    warnings.extend(discovery_warnings);

    let installed_names: HashSet<String> = installed.iter().map(|r| r.name.clone()).collect();
    let new_crds: Vec<NewCrdInfo> = proposed
        .iter()
        .filter(|c| !installed_names.contains(&c.name))
        .map(describe_new_crd)
        .collect();

    let proposed_names: HashSet<String> = proposed.iter().map(|r| r.name.clone()).collect();
    let installed_restricted: Vec<Resource> = installed
        .into_iter()
        .filter(|r| proposed_names.contains(&r.name))
        .collect();

    let mut ignores: Vec<String> = CRD_EXTRA_NOISE_PATHS.iter().map(|s| s.to_string()).collect();
    ignores.extend(extra_ignores.iter().cloned());

    let pairs = pair_crds_by_name(installed_restricted, proposed);
    let records = diff_all(&pairs, false, &ignores);
    let pair_by_key: IndexMap<String, &crate::pairing::ResourcePair> =
        pairs.iter().map(|p| (p.key(), p)).collect();

    let crds: Vec<CrdChangeDetail> = records
        .into_iter()
        .map(|record| {
            let pair = pair_by_key
                .get(&record.resource_key)
                .expect("every change record comes from a known pair");
            let risk_annotations = classifier::classify_all(&record.changes);

            let (ownership_conflict, stored_version_warnings_, schema_validation_errors) =
                if record.status == "changed" {
                    let installed = pair.old.as_ref();
                    let proposed = pair.new.as_ref();
                    let ownership_conflict = installed.and_then(|i| check_ownership_conflict(i, release));
                    let stored = match (installed, proposed) {
                        (Some(i), Some(p)) => stored_version_warnings(i, p),
                        _ => Vec::new(),
                    };
                    let schema_errors = proposed.map(|p| validate_live_instances(runner, p)).unwrap_or_default();
                    (ownership_conflict, stored, schema_errors)
                } else {
                    (None, Vec::new(), Vec::new())
                };

            CrdChangeDetail {
                name: record.name,
                status: record.status,
                changes: record.changes,
                risk_annotations,
                stored_version_warnings: stored_version_warnings_,
                schema_validation_errors,
                ownership_conflict,
            }
        })
        .collect();

    let policy_result = Some(evaluate_policy(policy_mode, &crds));
    if let Some(result) = &policy_result {
        tracing::debug!(mode = ?result.mode, blocked = result.blocked, "CRD policy evaluated");
    }

    CrdReport { crds, new_crds, policy_result, warnings }
}

/// Merge chart-`crds/`-directory and rendered-manifest CRDs by name; the
/// rendered manifest wins on conflict (§4.5.1).
fn merge_by_name(dir_crds: Vec<Resource>, manifest_crds: Vec<Resource>) -> Vec<Resource> {
    let mut by_name: IndexMap<String, Resource> =
        dir_crds.into_iter().map(|r| (r.name.clone(), r)).collect();
    for r in manifest_crds {
        by_name.insert(r.name.clone(), r);
    }
    by_name.into_values().collect()
}

fn discover_installed(runner: &dyn Runner) -> (Vec<Resource>, Vec<String>) {
    match runner.run(&["kubectl", "get", "crds", "-o", "yaml"]) {
        Ok(text) => match parse_list_or_stream(&text, "") {
            Ok(resources) => (resources, Vec::new()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse installed CRDs, continuing with an empty set");
                (Vec::new(), vec![format!("failed to parse installed CRDs: {e}")])
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "CRD discovery failed, continuing with an empty installed set");
            (Vec::new(), vec![format!("failed to discover installed CRDs: {e}")])
        }
    }
}

/// Validate every live instance of `proposed`'s custom resource against its
/// storage-version schema (§4.5.7). Both the live-instance fetch and a
/// missing/malformed schema degrade to "no errors" rather than failing the
/// run.
fn validate_live_instances(runner: &dyn Runner, proposed: &Resource) -> Vec<String> {
    let spec = match proposed.body.get("spec") {
        Some(s) => s,
        None => return Vec::new(),
    };
    let storage_version = spec
        .get("versions")
        .and_then(Json::as_array)
        .and_then(|versions| {
            versions
                .iter()
                .find(|v| v.get("storage").and_then(Json::as_bool) == Some(true))
        });
    let Some(storage_version) = storage_version else {
        return Vec::new();
    };
    let Some(schema) = storage_version.get("schema").and_then(|s| s.get("openAPIV3Schema")) else {
        return Vec::new();
    };
    let plural = spec
        .get("names")
        .and_then(|n| n.get("plural"))
        .and_then(Json::as_str)
        .unwrap_or_default();
    let group = spec.get("group").and_then(Json::as_str).unwrap_or_default();
    if plural.is_empty() || group.is_empty() {
        return Vec::new();
    }

    let target = format!("{plural}.{group}");
    let text = match runner.run(&["kubectl", "get", &target, "-A", "-o", "yaml"]) {
        Ok(text) => text,
        Err(_) => return Vec::new(),
    };
    let objects = match parse_list_or_stream(&text, "") {
        Ok(objects) => objects,
        Err(_) => return Vec::new(),
    };

    objects
        .iter()
        .flat_map(|obj| {
            let errors = validator::validate(schema, &obj.body);
            validator::format_errors(&obj.namespace, &obj.name, &errors)
        })
        .collect()
}
