//! Network load balancer with a manually registered target.

use proxystack_common::config::FrontStrategy;
use proxystack_common::error::Result;
use proxystack_common::types::{BalancerKind, Cidr, EntityId, Protocol};

use super::{TargetBinding, TrafficFront, TrafficFrontStrategy};
use crate::entity::{Listener, LoadBalancer, TargetRegistration};
use crate::security;
use crate::topology::Topology;

/// Id of the security group attached to the service.
pub const SECURITY_GROUP_ID: &str = "ProxySecurityGroup";
/// Id of the network load balancer.
pub const LOAD_BALANCER_ID: &str = "ProxyNlb";
/// Id of the TCP listener.
pub const LISTENER_ID: &str = "ProxyListener";
/// Id of the target registration.
pub const REGISTRATION_ID: &str = "ProxyTargets";

/// Layer-4 front: no HTTP assumptions, an explicit security group, and a
/// target registration declared after the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitFront {
    ingress_sources: Vec<Cidr>,
}

impl ExplicitFront {
    /// Creates the front admitting `ingress_sources` to the container port.
    #[must_use]
    pub const fn new(ingress_sources: Vec<Cidr>) -> Self {
        Self { ingress_sources }
    }
}

impl Default for ExplicitFront {
    fn default() -> Self {
        Self::new(security::default_ingress_sources())
    }
}

impl TrafficFrontStrategy for ExplicitFront {
    fn strategy(&self) -> FrontStrategy {
        FrontStrategy::Explicit
    }

    fn declare_security(
        &self,
        topology: &mut Topology,
        network: &EntityId,
        container_port: u16,
    ) -> Result<Vec<EntityId>> {
        let group = security::declare_security_group(
            topology,
            SECURITY_GROUP_ID,
            network,
            container_port,
            &self.ingress_sources,
        )?;
        Ok(vec![group])
    }

    fn declare_front(
        &self,
        topology: &mut Topology,
        network: &EntityId,
        service: &EntityId,
    ) -> Result<TrafficFront> {
        let (container_name, port) = {
            let svc = topology.require_service(service, &format!("registration \"{REGISTRATION_ID}\""))?;
            (svc.container_name.clone(), svc.target_port)
        };

        let load_balancer = topology.declare(
            LOAD_BALANCER_ID,
            LoadBalancer {
                network: network.clone(),
                kind: BalancerKind::Network,
                internet_facing: true,
            },
        )?;
        let listener = topology.declare(
            LISTENER_ID,
            Listener {
                load_balancer: load_balancer.clone(),
                port,
                protocol: Protocol::Tcp,
                default_target: None,
            },
        )?;
        let registration = topology.declare(
            REGISTRATION_ID,
            TargetRegistration {
                listener: listener.clone(),
                service: service.clone(),
                container_name,
                container_port: port,
                protocol: Protocol::Tcp,
            },
        )?;

        tracing::info!(port, "declared explicit traffic front");
        Ok(TrafficFront {
            strategy: FrontStrategy::Explicit,
            load_balancer,
            listener,
            binding: TargetBinding::Explicit { registration },
        })
    }
}
