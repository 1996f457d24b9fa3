//! CRD-specific pairing: by `metadata.name` rather than the full resource
//! identity key (§4.5.2) — CRDs are cluster-scoped and the installed copy's
//! `apiVersion` can differ cosmetically from the rendered chart's.

use indexmap::IndexMap;

use crate::pairing::{PairStatus, ResourcePair};
use crate::resource::Resource;

/// Pair installed against proposed CRDs by name. Output order is the union
/// of both name sequences, installed first, first-seen order preserved.
pub fn pair_crds_by_name(installed: Vec<Resource>, proposed: Vec<Resource>) -> Vec<ResourcePair> {
    let mut installed_by_name: IndexMap<String, Resource> =
        installed.into_iter().map(|r| (r.name.clone(), r)).collect();
    let mut proposed_by_name: IndexMap<String, Resource> =
        proposed.into_iter().map(|r| (r.name.clone(), r)).collect();

    let mut ordered_names: IndexMap<String, ()> = IndexMap::new();
    for name in installed_by_name.keys() {
        ordered_names.insert(name.clone(), ());
    }
    for name in proposed_by_name.keys() {
        ordered_names.insert(name.clone(), ());
    }

    ordered_names
        .into_keys()
        .map(|name| {
            let old = installed_by_name.shift_remove(&name);
            let new = proposed_by_name.shift_remove(&name);
            let status = match (&old, &new) {
                (None, Some(_)) => PairStatus::Added,
                (Some(_), None) => PairStatus::Removed,
                (Some(_), Some(_)) => PairStatus::Changed,
                (None, None) => unreachable!("name only exists if it came from one side"),
            };
            ResourcePair { old, new, status }
        })
        .collect()
}
