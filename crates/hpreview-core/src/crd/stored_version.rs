//! Stored-version safety (§4.5.6).
//!
//! `status.storedVersions` on the installed CRD names the schema versions
//! under which existing objects are physically persisted. If the proposed
//! CRD drops one of those versions from `spec.versions`, existing objects
//! become inaccessible until a conversion/migration runs.

use serde_json::Value as Json;

use crate::resource::Resource;

/// Warnings for stored versions the proposed CRD no longer serves. Empty
/// when `status.storedVersions` is absent or empty on the installed copy.
pub fn stored_version_warnings(installed: &Resource, proposed: &Resource) -> Vec<String> {
    let stored: Vec<String> = installed
        .body
        .get("status")
        .and_then(|s| s.get("storedVersions"))
        .and_then(Json::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    if stored.is_empty() {
        return Vec::new();
    }

    let served: Vec<String> = proposed
        .body
        .get("spec")
        .and_then(|s| s.get("versions"))
        .and_then(Json::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.get("name").and_then(Json::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    stored
        .into_iter()
        .filter(|sv| !served.contains(sv))
        .map(|sv| {
            format!(
                "existing objects stored as version '{sv}' of `{}` will become inaccessible until migrated to a version still served by the updated CRD",
                installed.name
            )
        })
        .collect()
}
