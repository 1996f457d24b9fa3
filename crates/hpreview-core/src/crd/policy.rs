//! Admission policy evaluation (§4.5.8). A pure function of the assembled
//! [`CrdReport`](super::report::CrdReport)'s CRD details plus the mode
//! selected on the command line.

use serde::Serialize;

use super::report::CrdChangeDetail;
use crate::risk::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    Ignore,
    Warn,
    Fail,
}

impl std::str::FromStr for PolicyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(Self::Ignore),
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown CRD policy mode `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyResult {
    pub mode: PolicyMode,
    pub blocked: bool,
    pub message: String,
    pub exit_code: i32,
}

/// Evaluate the policy for one run. `crds` is the full set of analyzed CRD
/// details, including unchanged ones (those never raise `max_risk` above
/// SAFE and so never appear in the naming lists below).
pub fn evaluate_policy(mode: PolicyMode, crds: &[CrdChangeDetail]) -> PolicyResult {
    match mode {
        PolicyMode::Ignore => PolicyResult {
            mode,
            blocked: false,
            message: "CRD policy: ignore (all CRD issues suppressed)".to_string(),
            exit_code: 0,
        },
        PolicyMode::Warn => {
            let dangers = names_at(crds, RiskLevel::Danger);
            let warnings = names_at(crds, RiskLevel::Warning);
            let message = if dangers.is_empty() && warnings.is_empty() {
                "CRD policy: warn (no issues found)".to_string()
            } else {
                let mut parts = Vec::new();
                if !dangers.is_empty() {
                    parts.push(format!("DANGER: {}", dangers.join(", ")));
                }
                if !warnings.is_empty() {
                    parts.push(format!("WARNING: {}", warnings.join(", ")));
                }
                format!("CRD policy: warn ({})", parts.join("; "))
            };
            PolicyResult { mode, blocked: false, message, exit_code: 0 }
        }
        PolicyMode::Fail => {
            let dangers = names_at(crds, RiskLevel::Danger);
            if dangers.is_empty() {
                PolicyResult {
                    mode,
                    blocked: false,
                    message: "CRD policy: fail (passed, no DANGER-level changes)".to_string(),
                    exit_code: 0,
                }
            } else {
                PolicyResult {
                    mode,
                    blocked: true,
                    message: format!("CRD policy: fail (blocked by DANGER changes in {})", dangers.join(", ")),
                    exit_code: 1,
                }
            }
        }
    }
}

fn names_at(crds: &[CrdChangeDetail], level: RiskLevel) -> Vec<String> {
    crds.iter()
        .filter(|c| c.max_risk() == level)
        .map(|c| c.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{ChangeType, FieldChange};
    use crate::risk::RiskAnnotation;

    fn detail(name: &str, level: Option<RiskLevel>) -> CrdChangeDetail {
        let risk_annotations = level
            .map(|level| {
                vec![RiskAnnotation {
                    level,
                    rule: "test_rule",
                    message: String::new(),
                    path: String::new(),
                }]
            })
            .unwrap_or_default();
        CrdChangeDetail {
            name: name.to_string(),
            status: "changed".to_string(),
            changes: vec![FieldChange {
                path: "x".to_string(),
                old_value: None,
                new_value: None,
                change_type: ChangeType::ValueChanged,
            }],
            risk_annotations,
            stored_version_warnings: vec![],
            schema_validation_errors: vec![],
            ownership_conflict: None,
        }
    }

    #[test]
    fn ignore_never_blocks() {
        let crds = vec![detail("a", Some(RiskLevel::Danger))];
        let result = evaluate_policy(PolicyMode::Ignore, &crds);
        assert!(!result.blocked);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn warn_never_blocks_even_with_dangers() {
        let crds = vec![detail("a", Some(RiskLevel::Danger))];
        let result = evaluate_policy(PolicyMode::Warn, &crds);
        assert!(!result.blocked);
        assert!(result.message.contains("DANGER"));
        assert!(result.message.contains('a'));
    }

    #[test]
    fn warn_with_no_issues_says_so() {
        let crds = vec![detail("a", Some(RiskLevel::Safe))];
        let result = evaluate_policy(PolicyMode::Warn, &crds);
        assert!(result.message.contains("no issues found"));
    }

    #[test]
    fn fail_blocks_on_danger_with_exit_code_one() {
        let crds = vec![detail("a", Some(RiskLevel::Danger))];
        let result = evaluate_policy(PolicyMode::Fail, &crds);
        assert!(result.blocked);
        assert_eq!(result.exit_code, 1);
        assert!(result.message.contains('a'));
    }

    #[test]
    fn fail_does_not_block_on_warning_only() {
        let crds = vec![detail("a", Some(RiskLevel::Warning))];
        let result = evaluate_policy(PolicyMode::Fail, &crds);
        assert!(!result.blocked);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn fail_passes_with_no_crds() {
        let result = evaluate_policy(PolicyMode::Fail, &[]);
        assert!(!result.blocked);
    }
}
