//! API module - The Kubernetes resource model the injection engine operates on.
//!
//! Object metadata, label selectors and status conditions are the
//! generated `k8s_openapi` types. The parts of a Pod that presets can touch
//! are modelled here instead, with every unmodelled field carried through
//! as opaque JSON. A decoded pod re-encodes without loss, including fields
//! newer than any generated model, and two entries are only equal when all
//! of their fields are.

mod env;
mod meta;
mod pod;
mod preset;
mod volume;

pub use env::*;
pub use meta::*;
pub use pod::*;
pub use preset::*;
pub use volume::*;

/// Opaque JSON fields preserved across decode and encode.
pub type Extra = serde_json::Map<String, serde_json::Value>;
