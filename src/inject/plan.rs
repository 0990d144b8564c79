//! Merge plans and provenance annotations.

use std::collections::BTreeMap;

use crate::api::{Container, EnvFromSource, EnvVar, Pod, PodPreset, Volume, VolumeMount};
use crate::merge::{
    merge_env, merge_env_from, merge_volume_mounts, merge_volumes, ordered, Conflicts, Merged,
};

/// Namespace of every annotation written by the injector.
pub const ANNOTATION_PREFIX: &str = "podpreset.admission.kubernetes.io";

/// Returns the provenance annotation key recorded for a preset.
pub fn provenance_key(preset_name: &str) -> String {
    format!("{}/podpreset-{}", ANNOTATION_PREFIX, preset_name)
}

/// ContainerMerge holds the merged lists of one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerMerge {
    pub env: Option<Vec<EnvVar>>,
    pub env_from: Option<Vec<EnvFromSource>>,
    pub volume_mounts: Option<Vec<VolumeMount>>,
}

impl ContainerMerge {
    fn compute(container: &Container, presets: &[PodPreset], conflicts: &mut Conflicts) -> Self {
        let env = merge_env(container.env(), presets);
        let env_from = merge_env_from(container.env_from(), presets);
        let volume_mounts = merge_volume_mounts(container.volume_mounts(), presets);

        ContainerMerge {
            env: take(env, conflicts, Some(container.name.as_str())),
            env_from: take(env_from, conflicts, Some(container.name.as_str())),
            volume_mounts: take(volume_mounts, conflicts, Some(container.name.as_str())),
        }
    }

    /// Builds a new container carrying the merged lists.
    fn bind(self, container: Container) -> Container {
        Container {
            env: self.env,
            env_from: self.env_from,
            volume_mounts: self.volume_mounts,
            ..container
        }
    }
}

fn take<E>(merged: Merged<E>, conflicts: &mut Conflicts, container: Option<&str>) -> Option<Vec<E>> {
    match container {
        Some(name) => conflicts.extend(merged.conflicts.in_container(name)),
        None => conflicts.extend(merged.conflicts),
    }
    merged.entries
}

/// MergePlan is the complete merge of a pod with a set of presets.
///
/// A plan is only meaningful for the pod it was computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub volumes: Option<Vec<Volume>>,
    pub containers: Vec<ContainerMerge>,
    pub init_containers: Vec<ContainerMerge>,
    /// Provenance annotations, one per preset.
    pub provenance: BTreeMap<String, String>,
}

impl MergePlan {
    /// Computes the merge of `pod` with `presets` along with every conflict
    /// found on the way. Conflicting preset entries are left out of the plan.
    pub fn compute(pod: &Pod, presets: &[PodPreset]) -> (MergePlan, Conflicts) {
        let mut conflicts = Conflicts::new();

        let volumes = take(merge_volumes(pod.volumes(), presets), &mut conflicts, None);
        let containers = pod
            .spec
            .containers
            .iter()
            .map(|c| ContainerMerge::compute(c, presets, &mut conflicts))
            .collect();
        let init_containers = pod
            .init_containers()
            .iter()
            .map(|c| ContainerMerge::compute(c, presets, &mut conflicts))
            .collect();
        let provenance = ordered(presets)
            .into_iter()
            .map(|p| (provenance_key(p.name()), p.resource_version().to_string()))
            .collect();

        let plan = MergePlan {
            volumes,
            containers,
            init_containers,
            provenance,
        };
        (plan, conflicts)
    }

    /// Returns true if the plan came from an empty preset set.
    pub fn is_empty(&self) -> bool {
        self.provenance.is_empty()
    }

    /// Binds the plan onto `pod`.
    ///
    /// An empty plan returns the pod untouched; otherwise every container
    /// slot is replaced by a rebuilt container and one provenance annotation
    /// per preset is recorded, even for presets that added nothing.
    pub fn apply(self, mut pod: Pod) -> Pod {
        if self.is_empty() {
            return pod;
        }

        pod.spec.volumes = self.volumes;
        pod.spec.containers = rebind(pod.spec.containers, self.containers);
        pod.spec.init_containers = pod
            .spec
            .init_containers
            .map(|containers| rebind(containers, self.init_containers));
        pod.metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .extend(self.provenance);
        pod
    }
}

fn rebind(containers: Vec<Container>, merges: Vec<ContainerMerge>) -> Vec<Container> {
    let mut merges = merges.into_iter();
    containers
        .into_iter()
        .map(|c| match merges.next() {
            Some(merge) => merge.bind(c),
            None => c,
        })
        .collect()
}

/// Determines whether `presets` can be injected into `pod` without
/// conflict. Every conflict from every attribute and container is returned
/// in one report.
pub fn probe(pod: &Pod, presets: &[PodPreset]) -> Result<MergePlan, Conflicts> {
    let (plan, conflicts) = MergePlan::compute(pod, presets);
    conflicts.into_result()?;
    Ok(plan)
}

/// Injects `presets` into `pod` unconditionally.
///
/// Never fails: an entry that conflicts is dropped and the pod's own value
/// is kept. Callers are expected to [`probe`] first.
pub fn apply_presets(pod: Pod, presets: &[PodPreset]) -> Pod {
    let (plan, _) = MergePlan::compute(&pod, presets);
    plan.apply(pod)
}
