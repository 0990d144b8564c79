//! Inject module - The Conflict Prober and Merge Applier.
//!
//! [`probe`] computes the complete merge of a pod with a set of presets
//! once, without touching the pod. When it finds no conflict it returns a
//! [`MergePlan`] which [`MergePlan::apply`] binds onto the pod. The plan is
//! never recomputed between the two steps.

mod plan;


pub use plan::*;
