//! Matching old (live) and new (proposed) resources by identity key.

use indexmap::IndexMap;

use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStatus {
    Added,
    Removed,
    Changed,
    Unchanged,
}

impl PairStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PairStatus::Added => "added",
            PairStatus::Removed => "removed",
            PairStatus::Changed => "changed",
            PairStatus::Unchanged => "unchanged",
        }
    }
}

/// A matched old/new pair, keyed by [`Resource::key`].
#[derive(Debug, Clone)]
pub struct ResourcePair {
    pub old: Option<Resource>,
    pub new: Option<Resource>,
    pub status: PairStatus,
}

impl ResourcePair {
    pub fn key(&self) -> String {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .expect("a pair always has at least one side")
            .key()
    }
}

/// Pair `old` against `new` by identity key.
///
/// Output order is the union of both key sequences, old first, first-seen
/// order preserved, duplicates suppressed. A key present in both starts as
/// `Changed` — the diff engine later reduces it to `Unchanged` once semantic
/// equality has been checked.
pub fn pair_resources(old: Vec<Resource>, new: Vec<Resource>) -> Vec<ResourcePair> {
    let mut old_by_key: IndexMap<String, Resource> =
        old.into_iter().map(|r| (r.key(), r)).collect();
    let mut new_by_key: IndexMap<String, Resource> =
        new.into_iter().map(|r| (r.key(), r)).collect();

    let mut ordered_keys: IndexMap<String, ()> = IndexMap::new();
    for key in old_by_key.keys() {
        ordered_keys.insert(key.clone(), ());
    }
    for key in new_by_key.keys() {
        ordered_keys.insert(key.clone(), ());
    }

    ordered_keys
        .into_keys()
        .map(|key| {
            let old = old_by_key.shift_remove(&key);
            let new = new_by_key.shift_remove(&key);
            let status = match (&old, &new) {
                (None, Some(_)) => PairStatus::Added,
                (Some(_), None) => PairStatus::Removed,
                (Some(_), Some(_)) => PairStatus::Changed,
                (None, None) => unreachable!("key only exists if it came from one side"),
            };
            ResourcePair { old, new, status }
        })
        .collect()
}
