//! Serializable snapshots of a topology and structural diffs between them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use proxystack_common::error::{Result, TopologyError};
use proxystack_common::types::{EntityId, EntityKind};

use crate::entity::Resource;
use crate::topology::Topology;

/// One entity in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntity {
    /// Entity identifier.
    pub id: EntityId,
    /// Direct dependencies, sorted.
    pub depends_on: Vec<EntityId>,
    /// Entity attributes.
    pub resource: Resource,
}

/// Declaration-ordered dump of a topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// Name of the stack the topology belongs to.
    pub stack: String,
    /// Every entity, in declaration order.
    pub entities: Vec<SnapshotEntity>,
}

impl TopologySnapshot {
    /// Captures `topology` under the stack name `stack`.
    #[must_use]
    pub fn capture(stack: impl Into<String>, topology: &Topology) -> Self {
        let entities = topology
            .iter()
            .map(|(id, resource)| SnapshotEntity {
                id: id.clone(),
                depends_on: topology.dependencies_of(id),
                resource: resource.clone(),
            })
            .collect();
        Self {
            stack: stack.into(),
            entities,
        }
    }

    /// Serializes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a snapshot previously written with [`Self::to_json`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TopologyError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Number of entities of one kind.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities
            .iter()
            .filter(|e| e.resource.kind() == kind)
            .count()
    }
}

/// A structural difference between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    /// Entity only present in the new snapshot.
    Added {
        /// Entity identifier.
        id: EntityId,
        /// Entity kind.
        kind: EntityKind,
    },
    /// Entity only present in the old snapshot.
    Removed {
        /// Entity identifier.
        id: EntityId,
        /// Entity kind.
        kind: EntityKind,
    },
    /// Entity present in both with different attributes or dependencies.
    /// A kind change shows up as a replacement.
    Changed {
        /// Entity identifier.
        id: EntityId,
        /// Entity kind in the new snapshot.
        kind: EntityKind,
        /// Whether the provider has to replace rather than update it.
        replace: bool,
    },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { id, kind } => write!(f, "+ {kind} {id}"),
            Self::Removed { id, kind } => write!(f, "- {kind} {id}"),
            Self::Changed {
                id,
                kind,
                replace: true,
            } => write!(f, "-/+ {kind} {id}"),
            Self::Changed { id, kind, .. } => write!(f, "~ {kind} {id}"),
        }
    }
}

/// Compares two snapshots entity by entity.
///
/// Removals come first, in the old snapshot's order, followed by additions
/// and changes in the new snapshot's order.
#[must_use]
pub fn diff(previous: &TopologySnapshot, next: &TopologySnapshot) -> Vec<Change> {
    let before: BTreeMap<&EntityId, &SnapshotEntity> =
        previous.entities.iter().map(|e| (&e.id, e)).collect();
    let after: BTreeMap<&EntityId, &SnapshotEntity> =
        next.entities.iter().map(|e| (&e.id, e)).collect();

    let mut changes: Vec<Change> = previous
        .entities
        .iter()
        .filter(|e| !after.contains_key(&e.id))
        .map(|e| Change::Removed {
            id: e.id.clone(),
            kind: e.resource.kind(),
        })
        .collect();

    for entity in &next.entities {
        match before.get(&entity.id) {
            None => changes.push(Change::Added {
                id: entity.id.clone(),
                kind: entity.resource.kind(),
            }),
            Some(old) if *old != entity => changes.push(Change::Changed {
                id: entity.id.clone(),
                kind: entity.resource.kind(),
                replace: old.resource.kind() != entity.resource.kind(),
            }),
            Some(_) => {}
        }
    }
    changes
}
