//! Object metadata.

use std::collections::BTreeMap;

pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// ObjectMetaExt reads the metadata fields injection depends on, treating
/// absent values as empty.
pub trait ObjectMetaExt {
    /// Returns the name, or an empty string when unset.
    fn name(&self) -> &str;

    /// Returns the namespace, or an empty string when unset.
    fn namespace(&self) -> &str;

    /// Returns the value of an annotation if present.
    fn annotation(&self, key: &str) -> Option<&str>;

    /// Returns the labels, treating an absent map as empty.
    fn labels(&self) -> BTreeMap<String, String>;
}

impl ObjectMetaExt for ObjectMeta {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or_default()
    }

    fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .as_ref()
            .and_then(|a| a.get(key))
            .map(String::as_str)
    }

    fn labels(&self) -> BTreeMap<String, String> {
        self.labels.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_maps_are_not_serialized() {
        let meta = ObjectMeta {
            name: Some("web".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json, serde_json::json!({"name": "web"}));
    }

    #[test]
    fn test_server_fields_survive_roundtrip() {
        let json = serde_json::json!({
            "name": "web",
            "uid": "1234",
            "ownerReferences": [{
                "apiVersion": "apps/v1",
                "kind": "ReplicaSet",
                "name": "web-abc",
                "uid": "5678"
            }]
        });
        let meta: ObjectMeta = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(meta.uid.as_deref(), Some("1234"));
        assert_eq!(serde_json::to_value(&meta).unwrap(), json);
    }

    #[test]
    fn test_annotation_lookup() {
        let mut meta = ObjectMeta::default();
        assert_eq!(meta.annotation("a"), None);
        assert_eq!(meta.name(), "");

        meta.annotations = Some(BTreeMap::from([("a".to_string(), "b".to_string())]));
        assert_eq!(meta.annotation("a"), Some("b"));
    }
}
