//! Volume and volume mount types.
//!
//! As with env types, unmodelled fields are kept in `extra` and take part in
//! equality.

use serde::{Deserialize, Serialize};

use super::Extra;

/// Volume is a named volume declared at the pod level.
///
/// The common source kinds are typed; any other kind is kept in `other` so
/// that equality still covers the whole volume definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<ProjectedSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<ClaimSource>,

    #[serde(flatten)]
    pub other: Extra,
}

impl Volume {
    /// Creates an emptyDir volume.
    pub fn empty_dir(name: impl Into<String>) -> Self {
        Volume {
            name: name.into(),
            empty_dir: Some(EmptyDirSource::default()),
            ..Default::default()
        }
    }

    /// Creates a volume projecting a ConfigMap.
    pub fn config_map(name: impl Into<String>, config_map: impl Into<String>) -> Self {
        Volume {
            name: name.into(),
            config_map: Some(ProjectedSource {
                name: config_map.into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Creates a volume projecting a Secret.
    pub fn secret(name: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Volume {
            name: name.into(),
            secret: Some(SecretSource {
                secret_name: secret_name.into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyDirSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPathSource {
    pub path: String,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub path_type: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// ProjectedSource is a ConfigMap volume source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedSource {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<KeyToPath>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSource {
    #[serde(default)]
    pub secret_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<KeyToPath>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyToPath {
    pub key: String,
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<i32>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSource {
    pub claim_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// VolumeMount mounts a pod volume into a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,

    pub mount_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_propagation: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl VolumeMount {
    pub fn new(name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        VolumeMount {
            name: name.into(),
            mount_path: mount_path.into(),
            ..Default::default()
        }
    }

    /// Marks the mount read-only.
    pub fn read_only(mut self) -> Self {
        self.read_only = Some(true);
        self
    }
}
