//! Env and envFrom mergers.

use super::{merge_entries, Attribute, MergeEntry, MergeKey, Merged};
use crate::api::{EnvFromSource, EnvVar, PodPreset, PodPresetSpec};

impl MergeEntry for EnvVar {
    const ATTRIBUTE: Attribute = Attribute::Env;

    fn merge_keys(&self) -> Vec<MergeKey> {
        vec![MergeKey::Name(self.name.clone())]
    }

    fn equivalent(&self, other: &Self) -> bool {
        self == other
    }

    fn preset_entries(spec: &PodPresetSpec) -> &[Self] {
        &spec.env
    }
}

/// The envFrom identity: the prefix plus the names of the referenced
/// ConfigMap and Secret. An absent reference counts as an empty name.
pub fn env_from_key(source: &EnvFromSource) -> MergeKey {
    MergeKey::Source {
        prefix: source.prefix.clone(),
        config_map: source
            .config_map_ref
            .as_ref()
            .map(|r| r.name.clone())
            .unwrap_or_default(),
        secret: source
            .secret_ref
            .as_ref()
            .map(|r| r.name.clone())
            .unwrap_or_default(),
    }
}

impl MergeEntry for EnvFromSource {
    const ATTRIBUTE: Attribute = Attribute::EnvFrom;

    fn merge_keys(&self) -> Vec<MergeKey> {
        vec![env_from_key(self)]
    }

    // Sources sharing a key can still differ in their `optional` flags.
    fn equivalent(&self, other: &Self) -> bool {
        self == other
    }

    fn preset_entries(spec: &PodPresetSpec) -> &[Self] {
        &spec.env_from
    }
}

/// Merges a container's env vars with the env vars injected by `presets`.
pub fn merge_env(env: &[EnvVar], presets: &[PodPreset]) -> Merged<EnvVar> {
    merge_entries(env, presets)
}

/// Merges a container's envFrom sources with those injected by `presets`.
pub fn merge_env_from(sources: &[EnvFromSource], presets: &[PodPreset]) -> Merged<EnvFromSource> {
    merge_entries(sources, presets)
}
