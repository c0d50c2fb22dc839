//! The entity arena.
//!
//! A [`Topology`] owns every declared entity, keyed by [`EntityId`].
//! Declaring an entity resolves its references immediately: a reference
//! to something not yet declared (or of the wrong kind) is rejected, so
//! the graph can only grow dependencies-first and never contains a cycle.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;

use proxystack_common::error::{Result, TopologyError};
use proxystack_common::types::{EntityId, EntityKind};

use crate::entity::{Listener, Resource, RunningService, TaskSpecification};
use crate::graph::DependencyGraph;

#[derive(Debug, Clone)]
struct Entry {
    id: EntityId,
    resource: Resource,
    node: NodeIndex,
}

/// Arena of named entities plus their dependency graph.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    entries: Vec<Entry>,
    index: HashMap<EntityId, usize>,
    graph: DependencyGraph,
}

impl Topology {
    /// Creates an empty topology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an entity under `id`.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation if `id` is taken or a local invariant
    /// fails, and a referential error if a reference cannot be resolved.
    pub fn declare(&mut self, id: impl Into<EntityId>, resource: impl Into<Resource>) -> Result<EntityId> {
        let id = id.into();
        let resource = resource.into();

        if self.index.contains_key(&id) {
            return Err(TopologyError::constraint(format!(
                "duplicate entity id \"{id}\""
            )));
        }
        resource.check_local(&id)?;

        let mut dependencies = Vec::new();
        for (expected, target) in resource.references() {
            let entry = self.lookup(target).ok_or_else(|| TopologyError::Referential {
                referrer: format!("{} \"{id}\"", resource.kind()),
                expected: expected.as_str(),
                id: target.to_string(),
                reason: "not declared".into(),
            })?;
            if entry.resource.kind() != expected {
                return Err(TopologyError::Referential {
                    referrer: format!("{} \"{id}\"", resource.kind()),
                    expected: expected.as_str(),
                    id: target.to_string(),
                    reason: format!("is a {}", entry.resource.kind()),
                });
            }
            dependencies.push(entry.node);
        }

        let node = self.graph.add_entity(id.clone());
        for dependency in dependencies {
            self.graph.add_dependency(node, dependency);
        }

        tracing::debug!(id = %id, kind = %resource.kind(), "declared entity");
        let _ = self.index.insert(id.clone(), self.entries.len());
        self.entries.push(Entry {
            id: id.clone(),
            resource,
            node,
        });
        Ok(id)
    }

    fn lookup(&self, id: &EntityId) -> Option<&Entry> {
        self.index.get(id).and_then(|&i| self.entries.get(i))
    }

    /// Returns the entity declared under `id`.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&Resource> {
        self.lookup(id).map(|e| &e.resource)
    }

    /// Returns `true` if `id` has been declared.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    /// Iterates entities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Resource)> {
        self.entries.iter().map(|e| (&e.id, &e.resource))
    }

    /// Iterates entities of one kind in declaration order.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = (&EntityId, &Resource)> {
        self.iter().filter(move |(_, r)| r.kind() == kind)
    }

    /// Number of entities of one kind.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Total number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers `id` directly depends on, sorted.
    #[must_use]
    pub fn dependencies_of(&self, id: &EntityId) -> Vec<EntityId> {
        self.lookup(id)
            .map(|e| self.graph.dependencies_of(e.node))
            .unwrap_or_default()
    }

    /// Number of dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Creation order for an external provisioning engine.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation if the graph contains a cycle.
    pub fn deployment_order(&self) -> Result<Vec<EntityId>> {
        self.graph.resolve_order()
    }

    /// Returns the task declared under `id`, on behalf of `referrer`.
    ///
    /// # Errors
    ///
    /// Returns a referential error if `id` is missing or not a task.
    pub fn require_task(&self, id: &EntityId, referrer: &str) -> Result<&TaskSpecification> {
        self.require(id, referrer, EntityKind::Task, Resource::as_task)
    }

    /// Returns the service declared under `id`, on behalf of `referrer`.
    ///
    /// # Errors
    ///
    /// Returns a referential error if `id` is missing or not a service.
    pub fn require_service(&self, id: &EntityId, referrer: &str) -> Result<&RunningService> {
        self.require(id, referrer, EntityKind::Service, Resource::as_service)
    }

    /// Returns the listener declared under `id`, on behalf of `referrer`.
    ///
    /// # Errors
    ///
    /// Returns a referential error if `id` is missing or not a listener.
    pub fn require_listener(&self, id: &EntityId, referrer: &str) -> Result<&Listener> {
        self.require(id, referrer, EntityKind::Listener, Resource::as_listener)
    }

    fn require<'a, T>(
        &'a self,
        id: &EntityId,
        referrer: &str,
        kind: EntityKind,
        project: fn(&'a Resource) -> Option<&'a T>,
    ) -> Result<&'a T> {
        let resource = self.get(id).ok_or_else(|| TopologyError::Referential {
            referrer: referrer.to_string(),
            expected: kind.as_str(),
            id: id.to_string(),
            reason: "not declared".into(),
        })?;
        project(resource).ok_or_else(|| TopologyError::Referential {
            referrer: referrer.to_string(),
            expected: kind.as_str(),
            id: id.to_string(),
            reason: format!("is a {}", resource.kind()),
        })
    }
}
