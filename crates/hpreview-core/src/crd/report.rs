//! The CRD analysis result types (§3, `CrdChangeDetail`/`CrdReport`).

use serde::Serialize;

use super::new_crd::NewCrdInfo;
use super::policy::PolicyResult;
use crate::diff::FieldChange;
use crate::risk::{max_risk, RiskAnnotation, RiskLevel};

/// Per-CRD analysis detail.
#[derive(Debug, Clone, Serialize)]
pub struct CrdChangeDetail {
    pub name: String,
    pub status: String,
    pub changes: Vec<FieldChange>,
    pub risk_annotations: Vec<RiskAnnotation>,
    pub stored_version_warnings: Vec<String>,
    pub schema_validation_errors: Vec<String>,
    pub ownership_conflict: Option<String>,
}

impl CrdChangeDetail {
    /// Highest risk level across this CRD's annotations, `SAFE` if none.
    pub fn max_risk(&self) -> RiskLevel {
        max_risk(&self.risk_annotations)
    }
}

/// Full CRD-pipeline output, ready to hand to a renderer.
#[derive(Debug, Clone, Serialize)]
pub struct CrdReport {
    pub crds: Vec<CrdChangeDetail>,
    pub new_crds: Vec<NewCrdInfo>,
    pub policy_result: Option<PolicyResult>,
    pub warnings: Vec<String>,
}

impl CrdReport {
    pub fn has_issues(&self) -> bool {
        self.crds.iter().any(|c| c.max_risk() != RiskLevel::Safe)
    }

    pub fn has_dangers(&self) -> bool {
        self.crds.iter().any(|c| c.max_risk() == RiskLevel::Danger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChangeType;

    fn detail_with(level: RiskLevel) -> CrdChangeDetail {
        CrdChangeDetail {
            name: "widgets.example.com".to_string(),
            status: "changed".to_string(),
            changes: vec![FieldChange {
                path: "spec.scope".to_string(),
                old_value: None,
                new_value: None,
                change_type: ChangeType::ValueChanged,
            }],
            risk_annotations: vec![RiskAnnotation {
                level,
                rule: "test",
                message: String::new(),
                path: "spec.scope".to_string(),
            }],
            stored_version_warnings: vec![],
            schema_validation_errors: vec![],
            ownership_conflict: None,
        }
    }

    #[test]
    fn has_issues_true_for_warning_or_danger() {
        let report = CrdReport {
            crds: vec![detail_with(RiskLevel::Warning)],
            new_crds: vec![],
            policy_result: None,
            warnings: vec![],
        };
        assert!(report.has_issues());
        assert!(!report.has_dangers());
    }

    #[test]
    fn has_dangers_true_only_for_danger() {
        let report = CrdReport {
            crds: vec![detail_with(RiskLevel::Danger)],
            new_crds: vec![],
            policy_result: None,
            warnings: vec![],
        };
        assert!(report.has_dangers());
    }

    #[test]
    fn safe_only_has_no_issues() {
        let report = CrdReport {
            crds: vec![detail_with(RiskLevel::Safe)],
            new_crds: vec![],
            policy_result: None,
            warnings: vec![],
        };
        assert!(!report.has_issues());
    }
}
