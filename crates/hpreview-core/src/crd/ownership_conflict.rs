//! Ownership conflict detection for CRDs that exist both installed and
//! proposed (§4.5.5).

use crate::ownership::{detect_ownership, Manager};
use crate::resource::Resource;

/// `None` when the installed copy has no ownership markers at all, or when
/// it's Helm-managed by the same release this upgrade belongs to.
pub fn check_ownership_conflict(installed: &Resource, current_release: &str) -> Option<String> {
    let info = detect_ownership(installed);
    match info.manager {
        Manager::Unknown => None,
        Manager::Helm => {
            let owning_release = info.release.as_deref().unwrap_or("<unknown>");
            if owning_release == current_release {
                None
            } else {
                Some(format!(
                    "CRD `{}` is managed by Helm release `{owning_release}`, not `{current_release}`",
                    installed.name
                ))
            }
        }
        other => Some(format!(
            "CRD `{}` is managed by {}, not Helm",
            installed.name,
            other.as_str()
        )),
    }
}
