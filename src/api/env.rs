//! Environment variable types.
//!
//! Every struct keeps the fields it does not model in `extra`, so entries
//! re-encode without loss and equality covers the whole entry.

use serde::{Deserialize, Serialize};

use super::Extra;

/// EnvVar is a single environment variable in a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl EnvVar {
    /// Creates a literal environment variable.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        EnvVar {
            name: name.into(),
            value: Some(value.into()),
            ..Default::default()
        }
    }
}

/// EnvVarSource is the source of an environment variable's value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_key_ref: Option<KeySelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<KeySelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_ref: Option<Extra>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_field_ref: Option<Extra>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// KeySelector selects a key of a ConfigMap or Secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySelector {
    #[serde(default)]
    pub name: String,

    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// EnvFromSource populates a container's environment from a ConfigMap or Secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvFromSource {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_ref: Option<SourceRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SourceRef>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl EnvFromSource {
    /// Creates a source importing every key of a ConfigMap.
    pub fn config_map(name: impl Into<String>) -> Self {
        EnvFromSource {
            config_map_ref: Some(SourceRef::new(name)),
            ..Default::default()
        }
    }

    /// Creates a source importing every key of a Secret.
    pub fn secret(name: impl Into<String>) -> Self {
        EnvFromSource {
            secret_ref: Some(SourceRef::new(name)),
            ..Default::default()
        }
    }

    /// Sets the prefix prepended to every imported key.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// SourceRef names a ConfigMap or Secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl SourceRef {
    pub fn new(name: impl Into<String>) -> Self {
        SourceRef {
            name: name.into(),
            ..Default::default()
        }
    }
}
