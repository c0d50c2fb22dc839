//! Application load balancer wired by a single composite declaration.

use proxystack_common::config::FrontStrategy;
use proxystack_common::error::Result;
use proxystack_common::types::{BalancerKind, EntityId, Protocol};

use super::{TargetBinding, TrafficFront, TrafficFrontStrategy};
use crate::entity::{Listener, LoadBalancer, TargetGroup};
use crate::topology::Topology;

/// Layer-7 front: balancer, listener, and target group come as one unit and
/// the target binding is implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegratedFront {
    scope: String,
}

impl IntegratedFront {
    /// Creates the front with entity ids nested under `scope`.
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    fn child(&self, name: &str) -> EntityId {
        EntityId::new(format!("{}/{name}", self.scope))
    }
}

impl Default for IntegratedFront {
    fn default() -> Self {
        Self::new("LoadBalancedService")
    }
}

impl TrafficFrontStrategy for IntegratedFront {
    fn strategy(&self) -> FrontStrategy {
        FrontStrategy::Integrated
    }

    fn declare_security(
        &self,
        _topology: &mut Topology,
        _network: &EntityId,
        _container_port: u16,
    ) -> Result<Vec<EntityId>> {
        Ok(Vec::new())
    }

    fn declare_front(
        &self,
        topology: &mut Topology,
        network: &EntityId,
        service: &EntityId,
    ) -> Result<TrafficFront> {
        let port = topology
            .require_service(service, &format!("integrated front \"{}\"", self.scope))?
            .target_port;

        let load_balancer = topology.declare(
            self.child("LB"),
            LoadBalancer {
                network: network.clone(),
                kind: BalancerKind::Application,
                internet_facing: true,
            },
        )?;
        let target_group = topology.declare(
            self.child("TargetGroup"),
            TargetGroup {
                service: service.clone(),
                port,
                protocol: Protocol::Http,
            },
        )?;
        let listener = topology.declare(
            self.child("PublicListener"),
            Listener {
                load_balancer: load_balancer.clone(),
                port,
                protocol: Protocol::Http,
                default_target: Some(target_group.clone()),
            },
        )?;

        tracing::info!(scope = %self.scope, port, "declared integrated traffic front");
        Ok(TrafficFront {
            strategy: FrontStrategy::Integrated,
            load_balancer,
            listener,
            binding: TargetBinding::Implicit { target_group },
        })
    }
}
