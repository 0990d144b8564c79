//! Conflict types for merge operations.

use std::fmt;

/// Attribute identifies which injectable list a conflict was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    Env,
    EnvFrom,
    Volumes,
    VolumeMounts,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Env => "env",
            Attribute::EnvFrom => "envFrom",
            Attribute::Volumes => "volumes",
            Attribute::VolumeMounts => "volume mounts",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MergeKey is the identity of an entry within its attribute's key space.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MergeKey {
    /// Env vars, volumes and volume mounts by name.
    Name(String),
    /// Volume mounts by mount path, independent of the name.
    MountPath(String),
    /// EnvFrom sources by prefix and referenced source names.
    Source {
        prefix: String,
        config_map: String,
        secret: String,
    },
}

impl fmt::Display for MergeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeKey::Name(name) => write!(f, "{}", name),
            MergeKey::MountPath(path) => write!(f, "mount path {}", path),
            MergeKey::Source {
                prefix,
                config_map,
                secret,
            } => write!(
                f,
                "source (prefix={:?}, configMapRef={:?}, secretRef={:?})",
                prefix, config_map, secret
            ),
        }
    }
}

/// Conflict represents two entries sharing a merge key with different values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The preset whose entry could not be merged.
    pub preset: String,
    pub attribute: Attribute,
    pub key: MergeKey,
    /// The container the conflict was found in; `None` for pod-level volumes.
    pub container: Option<String>,
    /// The rejected preset entry, rendered as JSON.
    pub incoming: String,
    /// The entry already holding the key, rendered as JSON.
    pub existing: String,
}

impl Conflict {
    /// Creates a new conflict.
    pub fn new(
        preset: impl Into<String>,
        attribute: Attribute,
        key: MergeKey,
        incoming: impl Into<String>,
        existing: impl Into<String>,
    ) -> Self {
        Conflict {
            preset: preset.into(),
            attribute,
            key,
            container: None,
            incoming: incoming.into(),
            existing: existing.into(),
        }
    }

    /// Scopes the conflict to a container.
    pub fn in_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "merging {} for {} has a conflict on {}: {} does not match {}",
            self.attribute, self.preset, self.key, self.incoming, self.existing
        )?;
        if let Some(container) = &self.container {
            write!(f, " in container {}", container)?;
        }
        Ok(())
    }
}

impl std::error::Error for Conflict {}

/// Conflicts is the aggregated report of every conflict found in one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conflicts {
    conflicts: Vec<Conflict>,
}

impl Conflicts {
    /// Creates a new empty Conflicts collection.
    pub fn new() -> Self {
        Conflicts {
            conflicts: Vec::new(),
        }
    }

    /// Adds a conflict.
    pub fn add(&mut self, conflict: Conflict) {
        self.conflicts.push(conflict);
    }

    /// Appends every conflict of another report.
    pub fn extend(&mut self, other: Conflicts) {
        self.conflicts.extend(other.conflicts);
    }

    /// Scopes every conflict in the report to a container.
    pub fn in_container(self, container: &str) -> Self {
        Conflicts {
            conflicts: self
                .conflicts
                .into_iter()
                .map(|c| c.in_container(container))
                .collect(),
        }
    }

    /// Returns true if there are no conflicts.
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Returns the number of conflicts.
    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    /// Returns an iterator over the conflicts.
    pub fn iter(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter()
    }

    /// Returns `Ok` when empty, otherwise the report itself as the error.
    pub fn into_result(self) -> Result<(), Conflicts> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for Conflicts {
    type Item = Conflict;
    type IntoIter = std::vec::IntoIter<Conflict>;

    fn into_iter(self) -> Self::IntoIter {
        self.conflicts.into_iter()
    }
}

impl FromIterator<Conflict> for Conflicts {
    fn from_iter<I: IntoIterator<Item = Conflict>>(iter: I) -> Self {
        Conflicts {
            conflicts: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Conflicts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conflict) in self.conflicts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", conflict)?;
        }
        Ok(())
    }
}

impl std::error::Error for Conflicts {}
