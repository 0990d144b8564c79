//! Volume and volume mount mergers.

use super::{merge_entries, Attribute, MergeEntry, MergeKey, Merged};
use crate::api::{PodPreset, PodPresetSpec, Volume, VolumeMount};

impl MergeEntry for Volume {
    const ATTRIBUTE: Attribute = Attribute::Volumes;

    fn merge_keys(&self) -> Vec<MergeKey> {
        vec![MergeKey::Name(self.name.clone())]
    }

    fn equivalent(&self, other: &Self) -> bool {
        self == other
    }

    fn preset_entries(spec: &PodPresetSpec) -> &[Self] {
        &spec.volumes
    }
}

impl MergeEntry for VolumeMount {
    const ATTRIBUTE: Attribute = Attribute::VolumeMounts;

    /// A mount is identified by its name and, independently, by its path.
    fn merge_keys(&self) -> Vec<MergeKey> {
        vec![
            MergeKey::Name(self.name.clone()),
            MergeKey::MountPath(self.mount_path.clone()),
        ]
    }

    fn equivalent(&self, other: &Self) -> bool {
        self == other
    }

    fn preset_entries(spec: &PodPresetSpec) -> &[Self] {
        &spec.volume_mounts
    }
}

/// Merges pod-level volumes with the volumes injected by `presets`.
///
/// A result without entries is `None`, never an empty list.
pub fn merge_volumes(volumes: &[Volume], presets: &[PodPreset]) -> Merged<Volume> {
    merge_entries(volumes, presets)
}

/// Merges a container's volume mounts with those injected by `presets`.
pub fn merge_volume_mounts(mounts: &[VolumeMount], presets: &[PodPreset]) -> Merged<VolumeMount> {
    merge_entries(mounts, presets)
}
