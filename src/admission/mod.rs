//! Admission module - Request orchestration around the injection engine.
//!
//! A request flows through cheap exclusion checks, preset lookup and
//! selector filtering before the prober runs. Conflicts fail open: the pod
//! is admitted unchanged and the full report is logged. A mutated pod is
//! answered with a JSON patch computed by `json_patch::diff`.

mod lookup;
mod mutator;
mod review;

#[cfg(test)]
mod admission_test;

pub use lookup::*;
pub use mutator::*;
pub use review::*;
