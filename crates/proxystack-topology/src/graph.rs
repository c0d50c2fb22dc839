//! Dependency graph management using `petgraph`.
//!
//! Edges point from a dependency to its dependents so that a topological
//! sort yields the order in which an external provisioning engine has to
//! create resources.

use petgraph::graph::NodeIndex;

use proxystack_common::error::{Result, TopologyError};
use proxystack_common::types::EntityId;

/// A dependency graph of declared entities.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: petgraph::Graph<EntityId, ()>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: petgraph::Graph::new(),
        }
    }

    /// Adds an entity node to the graph.
    pub fn add_entity(&mut self, id: EntityId) -> NodeIndex {
        self.graph.add_node(id)
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.add_edge(dependency, dependent, ());
    }

    /// Returns the identifiers `node` directly depends on.
    #[must_use]
    pub fn dependencies_of(&self, node: NodeIndex) -> Vec<EntityId> {
        let mut deps: Vec<EntityId> = self
            .graph
            .neighbors_directed(node, petgraph::Direction::Incoming)
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect();
        deps.sort();
        deps.dedup();
        deps
    }

    /// Returns a topological ordering: dependencies before dependents.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation if the graph contains a cycle.
    pub fn resolve_order(&self) -> Result<Vec<EntityId>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => {
                let at = self
                    .graph
                    .node_weight(cycle.node_id())
                    .map_or_else(String::new, ToString::to_string);
                Err(TopologyError::constraint(format!(
                    "cyclic dependency detected at \"{at}\""
                )))
            }
        }
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
