//! The keyed union shared by every attribute merger.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use super::{Attribute, Conflict, Conflicts, MergeKey};
use crate::api::{PodPreset, PodPresetSpec};

/// MergeEntry describes how one attribute type is identified, compared and
/// read out of a preset.
pub trait MergeEntry: Clone + Debug + Serialize {
    /// The attribute this entry type belongs to.
    const ATTRIBUTE: Attribute;

    /// Returns every identity key of the entry. A collision on any key with
    /// a non-equivalent entry is a conflict.
    fn merge_keys(&self) -> Vec<MergeKey>;

    /// Returns true if two entries sharing a key carry the same value.
    fn equivalent(&self, other: &Self) -> bool;

    /// Returns the entries of this attribute a preset injects.
    fn preset_entries(spec: &PodPresetSpec) -> &[Self];

    /// Renders the entry for conflict reports.
    fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Merged is the outcome of merging one attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged<E> {
    /// The merged list, or `None` when it holds no entries.
    pub entries: Option<Vec<E>>,
    pub conflicts: Conflicts,
}

impl<E> Merged<E> {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Returns the presets in the order every merger iterates them: by name,
/// then namespace, then resourceVersion. Two revisions of the same preset
/// therefore merge in the same order however they were supplied.
pub fn ordered(presets: &[PodPreset]) -> Vec<&PodPreset> {
    let mut ordered: Vec<&PodPreset> = presets.iter().collect();
    ordered.sort_by(|a, b| {
        a.name()
            .cmp(b.name())
            .then_with(|| a.namespace().cmp(b.namespace()))
            .then_with(|| a.resource_version().cmp(b.resource_version()))
    });
    ordered
}

/// Merges `original` with the entries every preset injects for `E`.
///
/// The result keeps `original` in order and appends entries with unseen keys
/// in preset name order. Entries equivalent to one already present are
/// skipped. A key claimed with two different values is reported, and no
/// preset entry touching that key is injected, so the outcome does not
/// depend on which preset sorts first. Original entries are never replaced.
pub fn merge_entries<E: MergeEntry>(original: &[E], presets: &[PodPreset]) -> Merged<E> {
    let mut index: BTreeMap<MergeKey, E> = BTreeMap::new();
    for entry in original {
        for key in entry.merge_keys() {
            index.entry(key).or_insert_with(|| entry.clone());
        }
    }

    let mut injected: Vec<E> = Vec::new();
    let mut contested: BTreeSet<MergeKey> = BTreeSet::new();
    let mut conflicts = Conflicts::new();

    for preset in ordered(presets) {
        for entry in E::preset_entries(&preset.spec) {
            let keys = entry.merge_keys();
            let mut seen = false;
            let mut clean = true;

            for key in &keys {
                let Some(existing) = index.get(key) else {
                    continue;
                };
                seen = true;
                if !existing.equivalent(entry) {
                    clean = false;
                    contested.insert(key.clone());
                    conflicts.add(Conflict::new(
                        preset.name(),
                        E::ATTRIBUTE,
                        key.clone(),
                        entry.render(),
                        existing.render(),
                    ));
                }
            }

            if clean && !seen {
                for key in keys {
                    index.insert(key, entry.clone());
                }
                injected.push(entry.clone());
            }
        }
    }

    let mut merged: Vec<E> = original.to_vec();
    merged.extend(
        injected
            .into_iter()
            .filter(|e| e.merge_keys().iter().all(|k| !contested.contains(k))),
    );

    Merged {
        entries: if merged.is_empty() { None } else { Some(merged) },
        conflicts,
    }
}
