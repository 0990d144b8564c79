//! Merge module - Keyed set-union of preset attributes with conflict detection.
//!
//! Each injectable attribute (env, envFrom, volumes, volumeMounts) has its
//! own identity key space. Merging is a union keyed by identity: entries
//! already present are kept in place, new entries are appended in preset
//! name order, and an entry that shares a key with a different value is a
//! conflict.

mod conflict;
mod entry;
mod env;
mod volume;


pub use conflict::*;
pub use entry::*;
pub use env::*;
pub use volume::*;
