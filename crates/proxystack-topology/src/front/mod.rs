//! Traffic-front strategies.
//!
//! Both strategies expose the service's container port on an
//! internet-facing load balancer. They differ in who wires the pieces:
//!
//! - [`IntegratedFront`]: one composite declaration creates an application
//!   load balancer, a listener, and a target group bound to the service.
//! - [`ExplicitFront`]: a network load balancer, a TCP listener, a security
//!   group, and a target registration are declared one by one.

pub mod explicit;
pub mod integrated;

use serde::{Deserialize, Serialize};

use proxystack_common::config::FrontStrategy;
use proxystack_common::error::Result;
use proxystack_common::types::{Cidr, EntityId};

use crate::topology::Topology;

pub use self::explicit::ExplicitFront;
pub use self::integrated::IntegratedFront;

/// How the listener reaches the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "binding", rename_all = "snake_case")]
pub enum TargetBinding {
    /// The listener forwards to a target group created alongside it.
    Implicit {
        /// Target group bound to the service.
        target_group: EntityId,
    },
    /// A registration binds the listener to the service after both exist.
    Explicit {
        /// The registration entity.
        registration: EntityId,
    },
}

/// Entities making up a declared traffic front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficFront {
    /// Strategy that declared the front.
    pub strategy: FrontStrategy,
    /// The load balancer.
    pub load_balancer: EntityId,
    /// The listener on the load balancer.
    pub listener: EntityId,
    /// How the listener is bound to the service.
    pub binding: TargetBinding,
}

/// A way of putting a running service behind a public load balancer.
pub trait TrafficFrontStrategy: std::fmt::Debug {
    /// Which strategy this is.
    fn strategy(&self) -> FrontStrategy;

    /// Declares the security groups the service must be attached to.
    /// Called before the service exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a security group cannot be declared.
    fn declare_security(
        &self,
        topology: &mut Topology,
        network: &EntityId,
        container_port: u16,
    ) -> Result<Vec<EntityId>>;

    /// Declares the balancer, listener, and binding for `service`.
    /// Called after the service exists.
    ///
    /// # Errors
    ///
    /// Returns an error if `service` is not declared or any entity of the
    /// front cannot be declared.
    fn declare_front(
        &self,
        topology: &mut Topology,
        network: &EntityId,
        service: &EntityId,
    ) -> Result<TrafficFront>;
}

/// Returns the strategy implementation for `kind`. `ingress_sources` is
/// only used by the explicit strategy.
#[must_use]
pub fn strategy_for(kind: FrontStrategy, ingress_sources: Vec<Cidr>) -> Box<dyn TrafficFrontStrategy> {
    match kind {
        FrontStrategy::Integrated => Box::new(IntegratedFront::default()),
        FrontStrategy::Explicit => Box::new(ExplicitFront::new(ingress_sources)),
    }
}
