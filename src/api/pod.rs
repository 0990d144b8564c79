//! Pod, PodSpec and Container.

use serde::{Deserialize, Serialize};

use super::{EnvFromSource, EnvVar, Extra, ObjectMeta, ObjectMetaExt, Volume, VolumeMount};

/// Pod is the target resource presets are injected into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: PodSpec,

    #[serde(flatten)]
    pub extra: Extra,
}

/// PodSpec holds the containers and pod-level volumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_containers: Option<Vec<Container>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// Container is a single container within a pod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_from: Option<Vec<EnvFromSource>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_mounts: Option<Vec<VolumeMount>>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Container {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns the container's env vars, treating an absent list as empty.
    pub fn env(&self) -> &[EnvVar] {
        self.env.as_deref().unwrap_or_default()
    }

    /// Returns the container's envFrom sources, treating an absent list as empty.
    pub fn env_from(&self) -> &[EnvFromSource] {
        self.env_from.as_deref().unwrap_or_default()
    }

    /// Returns the container's volume mounts, treating an absent list as empty.
    pub fn volume_mounts(&self) -> &[VolumeMount] {
        self.volume_mounts.as_deref().unwrap_or_default()
    }
}

impl Pod {
    /// Returns the pod-level volumes, treating an absent list as empty.
    pub fn volumes(&self) -> &[Volume] {
        self.spec.volumes.as_deref().unwrap_or_default()
    }

    /// Returns the init containers, treating an absent list as empty.
    pub fn init_containers(&self) -> &[Container] {
        self.spec.init_containers.as_deref().unwrap_or_default()
    }

    /// Returns a human readable identity for log output.
    ///
    /// Pods under admission frequently have no name yet, only a generateName.
    pub fn display_name(&self) -> String {
        let name = match (&self.metadata.name, &self.metadata.generate_name) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, Some(generate_name)) => format!("{}*", generate_name),
            _ => String::new(),
        };
        format!("{}/{}", self.metadata.namespace(), name)
    }
}
