//! Top-level orchestration of one `diff` invocation (§5): fetch live and
//! proposed manifests, optionally refine the proposed set with a per-resource
//! server-side dry-run, split off `CustomResourceDefinition`s for the
//! deeper [`crd`](crate::crd) pipeline, then pair/diff/classify/own the rest.
//!
//! The only I/O here goes through [`Runner`]; everything else is pure.

use std::path::Path;

use crate::crd::pipeline::run_crd_pipeline;
use crate::crd::policy::PolicyMode;
use crate::crd::report::CrdReport;
use crate::diff::{diff_all, ChangeRecord};
use crate::error::{CoreError, Result};
use crate::ownership::{detect_ownership, OwnershipInfo};
use crate::pairing::{pair_resources, ResourcePair};
use crate::resource::{parse_multi_doc, Resource};
use crate::risk::{classify_all, removal_risk, RiskAnnotation};
use crate::runner::Runner;

/// Everything a `diff` run needs, gathered from CLI flags.
pub struct DiffOptions<'a> {
    pub release: &'a str,
    pub chart: &'a str,
    pub namespace: &'a str,
    pub values_files: &'a [String],
    pub set_values: &'a [String],
    pub version: Option<&'a str>,
    pub server_side: bool,
    pub show_all: bool,
    pub ignore_paths: Vec<String>,
    pub kubeconfig: Option<&'a str>,
    pub kube_context: Option<&'a str>,
    pub check_crds: bool,
    pub crd_policy: PolicyMode,
}

/// One general (non-CRD) resource change, with its risk and ownership
/// annotations already attached.
pub struct AnnotatedChange {
    pub record: ChangeRecord,
    pub risk: Vec<RiskAnnotation>,
    pub ownership: Option<OwnershipInfo>,
}

/// Resource counts across the whole paired set, independent of risk (§6).
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub unchanged: usize,
}

/// The fully assembled result of one `diff` invocation, ready for a renderer.
pub struct DiffOutput {
    pub summary: DiffSummary,
    pub changes: Vec<AnnotatedChange>,
    pub crd_report: Option<CrdReport>,
}

/// Run the full pipeline: fetch, pair, diff, classify, and (if requested)
/// the CRD pipeline.
pub fn run_diff(runner: &dyn Runner, opts: &DiffOptions) -> Result<DiffOutput> {
    let live_yaml = runner
        .run(&get_manifest_argv(opts))
        .map_err(CoreError::Fetch)?;
    let proposed_yaml = runner
        .run(&dry_run_upgrade_argv(opts))
        .map_err(CoreError::Fetch)?;

    let live = parse_multi_doc(&live_yaml, opts.namespace)?;
    let mut proposed = parse_multi_doc(&proposed_yaml, opts.namespace)?;

    if opts.server_side {
        proposed = proposed
            .into_iter()
            .map(|r| server_side_refine(runner, r, opts))
            .collect();
    }

    let (non_crd_live, non_crd_proposed, manifest_crds) = if opts.check_crds {
        let manifest_crds = crate::crd::extraction::extract_crds_from_resources(&proposed);
        let non_crd_live: Vec<Resource> = live.into_iter().filter(|r| !is_crd(r)).collect();
        let non_crd_proposed: Vec<Resource> = proposed.into_iter().filter(|r| !is_crd(r)).collect();
        (non_crd_live, non_crd_proposed, manifest_crds)
    } else {
        (live, proposed, Vec::new())
    };

    let pairs = pair_resources(non_crd_live, non_crd_proposed);
    let records = diff_all(&pairs, opts.show_all, &opts.ignore_paths);
    let pair_by_key: std::collections::HashMap<String, &ResourcePair> =
        pairs.iter().map(|p| (p.key(), p)).collect();

    let summary = DiffSummary {
        added: records.iter().filter(|r| r.status == "added").count(),
        removed: records.iter().filter(|r| r.status == "removed").count(),
        changed: records.iter().filter(|r| r.status == "changed").count(),
        unchanged: pairs.len() - records.len(),
    };

    let changes = records
        .into_iter()
        .map(|record| {
            let pair = pair_by_key
                .get(&record.resource_key)
                .expect("every change record comes from a known pair");
            let mut risk = classify_all(&record.changes);
            if record.status == "removed" {
                if let Some(annotation) = removal_risk(&record.kind, &record.resource_key) {
                    risk.push(annotation);
                }
            }
            let representative = pair.new.as_ref().or(pair.old.as_ref());
            let ownership = representative.map(detect_ownership);
            AnnotatedChange { record, risk, ownership }
        })
        .collect();

    let crd_report = if opts.check_crds {
        Some(run_crd_pipeline(
            runner,
            opts.release,
            Path::new(opts.chart),
            manifest_crds,
            opts.crd_policy,
            &opts.ignore_paths,
        ))
    } else {
        None
    };

    Ok(DiffOutput { summary, changes, crd_report })
}

fn is_crd(resource: &Resource) -> bool {
    resource.kind == "CustomResourceDefinition"
}

fn get_manifest_argv<'a>(opts: &'a DiffOptions<'a>) -> Vec<&'a str> {
    let mut argv = vec!["helm", "get", "manifest", opts.release, "--namespace", opts.namespace];
    if let Some(kubeconfig) = opts.kubeconfig {
        argv.push("--kubeconfig");
        argv.push(kubeconfig);
    }
    if let Some(kube_context) = opts.kube_context {
        argv.push("--kube-context");
        argv.push(kube_context);
    }
    argv
}

fn dry_run_upgrade_argv<'a>(opts: &'a DiffOptions<'a>) -> Vec<&'a str> {
    let mut argv = vec![
        "helm",
        "upgrade",
        opts.release,
        opts.chart,
        "--dry-run",
        "--namespace",
        opts.namespace,
    ];
    for values_file in opts.values_files {
        argv.push("--values");
        argv.push(values_file);
    }
    for set_value in opts.set_values {
        argv.push("--set");
        argv.push(set_value);
    }
    if let Some(version) = opts.version {
        argv.push("--version");
        argv.push(version);
    }
    if let Some(kubeconfig) = opts.kubeconfig {
        argv.push("--kubeconfig");
        argv.push(kubeconfig);
    }
    if let Some(kube_context) = opts.kube_context {
        argv.push("--kube-context");
        argv.push(kube_context);
    }
    argv
}

/// Re-render one proposed resource through a server-side dry-run, falling
/// back to the client-rendered copy on any failure (§7).
fn server_side_refine<'a>(runner: &dyn Runner, resource: Resource, opts: &'a DiffOptions<'a>) -> Resource {
    let mut argv = vec![
        "kubectl",
        "apply",
        "--dry-run=server",
        "-f",
        "-",
        "-o",
        "yaml",
        "--namespace",
        opts.namespace,
    ];
    if let Some(kubeconfig) = opts.kubeconfig {
        argv.push("--kubeconfig");
        argv.push(kubeconfig);
    }
    if let Some(kube_context) = opts.kube_context {
        argv.push("--context");
        argv.push(kube_context);
    }

    match runner.run_with_input(&argv, &resource.raw) {
        Ok(text) => match parse_multi_doc(&text, &resource.namespace) {
            Ok(mut refined) if !refined.is_empty() => refined.remove(0),
            _ => resource,
        },
        Err(e) => {
            tracing::warn!(
                resource = %resource.key(),
                error = %e,
                "server-side dry-run failed, falling back to the client-rendered resource"
            );
            resource
        }
    }
}
