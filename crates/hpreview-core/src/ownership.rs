//! Controller ownership detection (§4.4.2).

use serde::Serialize;
use serde_json::Value as Json;

use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Manager {
    Helm,
    Argocd,
    Flux,
    Unknown,
}

impl Manager {
    pub fn as_str(self) -> &'static str {
        match self {
            Manager::Helm => "Helm",
            Manager::Argocd => "ArgoCD",
            Manager::Flux => "Flux",
            Manager::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnershipInfo {
    pub manager: Manager,
    pub release: Option<String>,
    pub app: Option<String>,
}

/// Helm → ArgoCD → Flux, first match wins.
pub fn detect_ownership(resource: &Resource) -> OwnershipInfo {
    let labels = string_map(&resource.body, "labels");
    let annotations = string_map(&resource.body, "annotations");

    let managed_by = labels.get("app.kubernetes.io/managed-by").map(String::as_str);
    let helm_release = annotations.get("meta.helm.sh/release-name").cloned();
    if managed_by == Some("Helm") || helm_release.is_some() {
        return OwnershipInfo {
            manager: Manager::Helm,
            release: helm_release,
            app: labels.get("app.kubernetes.io/name").cloned(),
        };
    }

    let has_argocd_annotation = annotations.keys().any(|k| k.starts_with("argocd.argoproj.io/"));
    if labels.contains_key("app.kubernetes.io/instance") && has_argocd_annotation {
        return OwnershipInfo {
            manager: Manager::Argocd,
            release: labels.get("app.kubernetes.io/instance").cloned(),
            app: labels.get("app.kubernetes.io/name").cloned(),
        };
    }

    if let Some(name) = labels
        .get("kustomize.toolkit.fluxcd.io/name")
        .or_else(|| labels.get("helm.toolkit.fluxcd.io/name"))
    {
        return OwnershipInfo {
            manager: Manager::Flux,
            release: Some(name.clone()),
            app: labels.get("app.kubernetes.io/name").cloned(),
        };
    }

    OwnershipInfo { manager: Manager::Unknown, release: None, app: None }
}

fn string_map(body: &Json, field: &str) -> std::collections::BTreeMap<String, String> {
    body.get("metadata")
        .and_then(|m| m.get(field))
        .and_then(Json::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::parse_multi_doc;

    fn resource(yaml: &str) -> Resource {
        parse_multi_doc(yaml, "default").unwrap().remove(0)
    }

    #[test]
    fn helm_managed_by_label_wins() {
        let r = resource(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n  labels:\n    app.kubernetes.io/managed-by: Helm\n    app.kubernetes.io/name: myapp\n",
        );
        let info = detect_ownership(&r);
        assert_eq!(info.manager, Manager::Helm);
        assert_eq!(info.app.as_deref(), Some("myapp"));
    }

    #[test]
    fn helm_release_annotation_alone_is_sufficient() {
        let r = resource(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n  annotations:\n    meta.helm.sh/release-name: myrelease\n",
        );
        let info = detect_ownership(&r);
        assert_eq!(info.manager, Manager::Helm);
        assert_eq!(info.release.as_deref(), Some("myrelease"));
    }

    #[test]
    fn argocd_requires_both_label_and_annotation() {
        let r = resource(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n  labels:\n    app.kubernetes.io/instance: myapp\n  annotations:\n    argocd.argoproj.io/tracking-id: myapp:v1\n",
        );
        assert_eq!(detect_ownership(&r).manager, Manager::Argocd);
    }

    #[test]
    fn argocd_label_without_annotation_is_unknown() {
        let r = resource(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n  labels:\n    app.kubernetes.io/instance: myapp\n",
        );
        assert_eq!(detect_ownership(&r).manager, Manager::Unknown);
    }

    #[test]
    fn flux_kustomization_label() {
        let r = resource(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n  labels:\n    kustomize.toolkit.fluxcd.io/name: infra\n",
        );
        assert_eq!(detect_ownership(&r).manager, Manager::Flux);
    }

    #[test]
    fn no_markers_is_unknown() {
        let r = resource("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n");
        assert_eq!(detect_ownership(&r).manager, Manager::Unknown);
    }

    #[test]
    fn helm_precedes_argocd_when_both_present() {
        let r = resource(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n  labels:\n    app.kubernetes.io/managed-by: Helm\n    app.kubernetes.io/instance: myapp\n  annotations:\n    argocd.argoproj.io/tracking-id: myapp:v1\n",
        );
        assert_eq!(detect_ownership(&r).manager, Manager::Helm);
    }
}
