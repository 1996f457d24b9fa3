//! Parsing a multi-document YAML manifest stream into [`Resource`]s.

use serde_json::Value as Json;

use crate::error::{CoreError, Result};

/// A single parsed cluster object.
///
/// Immutable once constructed; noise stripping and normalization always
/// operate on a cloned `body`, never on the `Resource` itself.
#[derive(Debug, Clone)]
pub struct Resource {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub body: Json,
    pub raw: String,
}

impl Resource {
    /// `"<apiVersion>/<kind>/<namespace>/<name>"`; the namespace segment is
    /// empty for cluster-scoped objects.
    pub fn key(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_version, self.kind, self.namespace, self.name
        )
    }
}

/// Parse a multi-document YAML manifest stream into resources.
///
/// Empty documents and non-mapping documents are silently skipped. A
/// document whose `kind` is `List` is recursed into via its `items`. A
/// mapping document missing `metadata.name` is a hard error; a missing
/// `metadata.namespace` falls back to `default_namespace`.
pub fn parse_multi_doc(text: &str, default_namespace: &str) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();
    for doc in text.split("---") {
        let doc = doc.trim();
        if doc.is_empty() {
            continue;
        }
        if doc.lines().all(|l| l.trim().is_empty() || l.trim().starts_with('#')) {
            continue;
        }
        let value: serde_yaml::Value = serde_yaml::from_str(doc)?;
        collect_resources(value, doc, default_namespace, &mut resources)?;
    }
    Ok(resources)
}

/// Parse a `kubectl get ... -o yaml` response: either a `<Kind>List` wrapper
/// (read `items`) or a plain multi-document stream. Used by CRD discovery
/// and live custom-resource fetch (§4.5.1, §4.5.7), which accept both shapes
/// from the cluster client — unlike the manifest [`Parser`](parse_multi_doc),
/// which recurses only on the literal `kind: List`.
pub fn parse_list_or_stream(text: &str, default_namespace: &str) -> Result<Vec<Resource>> {
    if let Ok(serde_yaml::Value::Mapping(m)) = serde_yaml::from_str::<serde_yaml::Value>(text.trim()) {
        let kind = m
            .get(serde_yaml::Value::String("kind".to_string()))
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if kind.ends_with("List") {
            if let Some(serde_yaml::Value::Sequence(items)) =
                m.get(serde_yaml::Value::String("items".to_string()))
            {
                let mut out = Vec::new();
                for item in items {
                    collect_resources(item.clone(), text, default_namespace, &mut out)?;
                }
                return Ok(out);
            }
        }
    }
    parse_multi_doc(text, default_namespace)
}

pub(crate) fn collect_resources(
    value: serde_yaml::Value,
    raw: &str,
    default_namespace: &str,
    out: &mut Vec<Resource>,
) -> Result<()> {
    let mapping = match value {
        serde_yaml::Value::Mapping(ref m) if !m.is_empty() => value.clone(),
        _ => return Ok(()),
    };

    let json: Json = serde_json::to_value(&mapping).map_err(CoreError::Json)?;
    let obj = match json.as_object() {
        Some(o) => o,
        None => return Ok(()),
    };

    let kind = obj.get("kind").and_then(Json::as_str).unwrap_or_default();

    if kind == "List" {
        if let Some(items) = obj.get("items").and_then(Json::as_array) {
            for item in items {
                let item_yaml: serde_yaml::Value =
                    serde_json::from_value(item.clone()).map_err(CoreError::Json)?;
                collect_resources(item_yaml, raw, default_namespace, out)?;
            }
        }
        return Ok(());
    }

    let api_version = obj
        .get("apiVersion")
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_string();
    let metadata = obj.get("metadata").and_then(Json::as_object);
    let name = metadata
        .and_then(|m| m.get("name"))
        .and_then(Json::as_str)
        .ok_or_else(|| CoreError::InvalidResource(format!("{kind} resource missing metadata.name")))?
        .to_string();
    let namespace = metadata
        .and_then(|m| m.get("namespace"))
        .and_then(Json::as_str)
        .unwrap_or(default_namespace)
        .to_string();

    out.push(Resource {
        api_version,
        kind: kind.to_string(),
        namespace,
        name,
        body: json,
        raw: raw.trim().to_string(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_document() {
        let yaml = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n  namespace: ns\n";
        let resources = parse_multi_doc(yaml, "default").unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].kind, "ConfigMap");
        assert_eq!(resources[0].namespace, "ns");
        assert_eq!(resources[0].name, "cfg");
    }

    #[test]
    fn applies_default_namespace() {
        let yaml = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n";
        let resources = parse_multi_doc(yaml, "fallback").unwrap();
        assert_eq!(resources[0].namespace, "fallback");
    }

    #[test]
    fn cluster_scoped_resource_has_empty_namespace_when_requested() {
        let yaml =
            "apiVersion: apiextensions.k8s.io/v1\nkind: CustomResourceDefinition\nmetadata:\n  name: widgets.example.com\n";
        let resources = parse_multi_doc(yaml, "").unwrap();
        assert_eq!(resources[0].namespace, "");
        assert_eq!(resources[0].key(), "apiextensions.k8s.io/v1/CustomResourceDefinition//widgets.example.com");
    }

    #[test]
    fn splits_multi_document_stream() {
        let yaml = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: b\n";
        let resources = parse_multi_doc(yaml, "default").unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].name, "a");
        assert_eq!(resources[1].name, "b");
    }

    #[test]
    fn skips_empty_documents() {
        let yaml = "---\n---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n";
        let resources = parse_multi_doc(yaml, "default").unwrap();
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn recurses_into_list_kind() {
        let yaml = "apiVersion: v1\nkind: List\nitems:\n- apiVersion: v1\n  kind: ConfigMap\n  metadata:\n    name: a\n- apiVersion: v1\n  kind: ConfigMap\n  metadata:\n    name: b\n";
        let resources = parse_multi_doc(yaml, "default").unwrap();
        assert_eq!(resources.len(), 2);
    }

    #[test]
    fn missing_name_is_hard_error() {
        let yaml = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  namespace: ns\n";
        let err = parse_multi_doc(yaml, "default").unwrap_err();
        assert!(matches!(err, CoreError::InvalidResource(_)));
    }
}
