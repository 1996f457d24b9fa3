//! Gathering proposed CRDs from the rendered manifest and the chart's
//! `crds/` directory (§4.5.1).

use std::path::Path;

use crate::resource::{parse_multi_doc, Resource};

/// Filter a resource set down to `CustomResourceDefinition` kinds.
pub fn extract_crds_from_resources(resources: &[Resource]) -> Vec<Resource> {
    resources
        .iter()
        .filter(|r| r.kind == "CustomResourceDefinition")
        .cloned()
        .collect()
}

/// Read every `*.yaml`/`*.yml` file in `<chart_path>/crds/`.
///
/// A missing directory yields an empty set, no warning. A file that fails to
/// read or parse is skipped and described in the returned warnings, per the
/// degradable-failure contract (§4.5.1, §7).
pub fn extract_crds_from_chart_dir(chart_path: &Path) -> (Vec<Resource>, Vec<String>) {
    let crds_dir = chart_path.join("crds");
    if !crds_dir.is_dir() {
        return (Vec::new(), Vec::new());
    }

    let mut entries: Vec<_> = match std::fs::read_dir(&crds_dir) {
        Ok(rd) => rd.filter_map(Result::ok).collect(),
        Err(_) => return (Vec::new(), Vec::new()),
    };
    entries.sort_by_key(|e| e.file_name());

    let mut resources = Vec::new();
    let mut warnings = Vec::new();
    for entry in entries {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if !is_yaml {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match parse_multi_doc(&text, "") {
                Ok(parsed) => resources.extend(parsed.into_iter().filter(|r| r.kind == "CustomResourceDefinition")),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping unparseable CRD file");
                    warnings.push(format!("failed to parse CRD file {}: {e}", path.display()));
                }
            },
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unreadable CRD file");
                warnings.push(format!("failed to read CRD file {}: {e}", path.display()));
            }
        }
    }
    (resources, warnings)
}
