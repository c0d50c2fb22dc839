//! Declaration of the running service.

use proxystack_common::constants;
use proxystack_common::error::Result;
use proxystack_common::types::EntityId;

use crate::entity::RunningService;
use crate::topology::Topology;

/// Binds a cluster and a task into a [`RunningService`].
#[derive(Debug)]
pub struct ServiceProvisioner {
    cluster: EntityId,
    task: EntityId,
    desired_count: u32,
    security_groups: Vec<EntityId>,
}

impl ServiceProvisioner {
    /// Starts a service declaration running `task` inside `cluster`.
    #[must_use]
    pub const fn new(cluster: EntityId, task: EntityId) -> Self {
        Self {
            cluster,
            task,
            desired_count: constants::DEFAULT_DESIRED_COUNT,
            security_groups: Vec::new(),
        }
    }

    /// Sets the number of replicas.
    #[must_use]
    pub const fn desired_count(mut self, count: u32) -> Self {
        self.desired_count = count;
        self
    }

    /// Attaches security groups.
    #[must_use]
    pub fn security_groups(mut self, groups: Vec<EntityId>) -> Self {
        self.security_groups = groups;
        self
    }

    /// Declares the service under `id`. The target container and port are
    /// taken from the task so that they cannot drift from it.
    ///
    /// # Errors
    ///
    /// Returns a referential error if the task or cluster is missing, and a
    /// constraint violation if the desired count is zero.
    pub fn declare(self, topology: &mut Topology, id: impl Into<EntityId>) -> Result<EntityId> {
        let id = id.into();
        let task = topology.require_task(&self.task, &format!("service \"{id}\""))?;
        let service = RunningService {
            container_name: task.container().name.clone(),
            target_port: task.container_port(),
            cluster: self.cluster,
            task: self.task,
            desired_count: self.desired_count,
            security_groups: self.security_groups,
        };
        topology.declare(id, service)
    }
}
