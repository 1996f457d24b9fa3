//! New-CRD detection (§4.5.4).

use serde::Serialize;
use serde_json::Value as Json;

use crate::resource::Resource;

/// A proposed CRD with no installed counterpart.
#[derive(Debug, Clone, Serialize)]
pub struct NewCrdInfo {
    pub name: String,
    pub group: String,
    pub kind: String,
    pub versions: Vec<String>,
}

/// Build a [`NewCrdInfo`] from a proposed CRD resource.
pub fn describe_new_crd(crd: &Resource) -> NewCrdInfo {
    let spec = crd.body.get("spec");
    let group = spec
        .and_then(|s| s.get("group"))
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_string();
    let kind = spec
        .and_then(|s| s.get("names"))
        .and_then(|n| n.get("kind"))
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_string();
    let versions = spec
        .and_then(|s| s.get("versions"))
        .and_then(Json::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.get("name").and_then(Json::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    NewCrdInfo {
        name: crd.name.clone(),
        group,
        kind,
        versions,
    }
}
