//! Preset lookup.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::api::{PodPreset, PodPresetList};

/// LookupError reports that the presets of a namespace could not be listed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listing presets in namespace {namespace}: {message}")]
pub struct LookupError {
    pub namespace: String,
    pub message: String,
}

impl LookupError {
    pub fn new(namespace: impl Into<String>, message: impl Into<String>) -> Self {
        LookupError {
            namespace: namespace.into(),
            message: message.into(),
        }
    }
}

/// PresetLookup lists the presets visible in a namespace.
pub trait PresetLookup {
    fn list(&self, namespace: &str) -> Result<Vec<PodPreset>, LookupError>;
}

impl<F> PresetLookup for F
where
    F: Fn(&str) -> Result<Vec<PodPreset>, LookupError>,
{
    fn list(&self, namespace: &str) -> Result<Vec<PodPreset>, LookupError> {
        self(namespace)
    }
}

/// PresetStore is an in-memory preset lookup keyed by namespace.
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    namespaces: BTreeMap<String, Vec<PodPreset>>,
}

impl PresetStore {
    pub fn new() -> Self {
        PresetStore::default()
    }

    /// Builds a store, placing presets without a namespace in `default_namespace`.
    pub fn from_presets(
        presets: impl IntoIterator<Item = PodPreset>,
        default_namespace: &str,
    ) -> Self {
        let mut store = PresetStore::new();
        for preset in presets {
            store.insert(preset, default_namespace);
        }
        store
    }

    /// Adds a preset. A preset with the same name in the same namespace is replaced.
    pub fn insert(&mut self, mut preset: PodPreset, default_namespace: &str) {
        let namespace = match preset.namespace() {
            "" => default_namespace.to_string(),
            ns => ns.to_string(),
        };
        preset.metadata.namespace = Some(namespace.clone());

        let presets = self.namespaces.entry(namespace).or_default();
        presets.retain(|p| p.name() != preset.name());
        presets.push(preset);
    }

    /// Returns the number of presets across all namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PresetLookup for PresetStore {
    fn list(&self, namespace: &str) -> Result<Vec<PodPreset>, LookupError> {
        Ok(self.namespaces.get(namespace).cloned().unwrap_or_default())
    }
}

/// Parses presets from YAML.
///
/// The input may hold a single PodPreset, a PodPresetList, or several
/// YAML documents of either kind.
pub fn parse_presets(yaml: &str) -> Result<Vec<PodPreset>, serde_yaml::Error> {
    let mut presets = Vec::new();
    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = serde_yaml::Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        if value.get("items").is_some() {
            let list: PodPresetList = serde_yaml::from_value(value)?;
            presets.extend(list.items);
        } else {
            presets.push(serde_yaml::from_value(value)?);
        }
    }
    Ok(presets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_scopes_by_namespace() {
        let mut scoped = PodPreset::new("b");
        scoped.metadata.namespace = Some("shop".to_string());
        let store = PresetStore::from_presets(vec![PodPreset::new("a"), scoped], "default");

        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
        assert!(PresetStore::from_presets(vec![], "default").is_empty());
        let names: Vec<String> = store
            .list("default")
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(store.list("shop").unwrap().len(), 1);
        assert!(store.list("other").unwrap().is_empty());
    }

    #[test]
    fn test_store_replaces_same_name() {
        let mut store = PresetStore::new();
        let mut first = PodPreset::new("a");
        first.metadata.resource_version = Some("1".to_string());
        let mut second = PodPreset::new("a");
        second.metadata.resource_version = Some("2".to_string());

        store.insert(first, "default");
        store.insert(second, "default");

        let listed = store.list("default").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].resource_version(), "2");
    }

    #[test]
    fn test_closure_lookup() {
        let failing = |ns: &str| -> Result<Vec<PodPreset>, LookupError> {
            Err(LookupError::new(ns, "forbidden"))
        };
        let err = failing.list("shop").unwrap_err();
        assert_eq!(err.to_string(), "listing presets in namespace shop: forbidden");
    }

    #[test]
    fn test_parse_multi_document_presets() {
        let presets = parse_presets(
            r#"
apiVersion: redhatcop.redhat.io/v1alpha1
kind: PodPreset
metadata:
  name: one
spec:
  env:
  - name: A
    value: "1"
---
apiVersion: redhatcop.redhat.io/v1alpha1
kind: PodPresetList
items:
- metadata:
    name: two
- metadata:
    name: three
---
"#,
        )
        .unwrap();

        let names: Vec<&str> = presets.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(presets[0].spec.env.len(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed_presets() {
        assert!(parse_presets("metadata: [1, 2]").is_err());
    }
}
