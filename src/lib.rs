//! # PodPreset
//!
//! Selector-scoped configuration injection for Kubernetes pods.
//!
//! A PodPreset carries env vars, envFrom sources, volumes and volume mounts.
//! At admission time every preset whose selector matches a new pod is merged
//! into it. Merging is a keyed set union, and a merge that would overwrite
//! existing data is refused as a whole: the pod is admitted unchanged and the
//! full conflict report is logged.
//!
//! ## Modules
//!
//! - [`api`] - The pod and PodPreset resource model
//! - [`merge`] - Per-attribute keyed mergers with conflict detection
//! - [`inject`] - Probing a pod for conflicts and applying merge plans
//! - [`selector`] - Label selector evaluation
//! - [`admission`] - Request orchestration, preset lookup and patch emission
//! - [`config`] - Settings for the command line tool

pub mod admission;
pub mod api;
pub mod config;
pub mod error;
pub mod inject;
pub mod merge;
pub mod selector;

pub use admission::{
    MutationOutcome, PodAdmissionRequest, PodPresetMutator, PresetLookup, PresetStore,
};
pub use api::{Pod, PodPreset};
pub use error::AdmissionError;
pub use inject::{apply_presets, probe, MergePlan};
pub use merge::{Conflict, Conflicts};
pub use selector::{LabelSelectorMatcher, SelectorMatcher};
