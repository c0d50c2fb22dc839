//! Entities of a topology declaration.
//!
//! Every entity refers to its dependencies by [`EntityId`] only; the
//! [`Topology`](crate::topology::Topology) arena owns them all.

use serde::{Deserialize, Serialize};

use proxystack_common::env::ProxyEnvironment;
use proxystack_common::error::{Result, TopologyError};
use proxystack_common::types::{BalancerKind, Cidr, EntityId, EntityKind, Protocol};

/// An isolated virtual network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkBoundary {
    /// Number of availability zones the network spans.
    pub max_azs: u8,
}

/// Serverless compute capacity inside a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeCluster {
    /// Network hosting the cluster.
    pub network: EntityId,
}

/// Log group receiving container output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSink {
    /// How long log events are kept.
    pub retention_days: u32,
    /// Prefix of every log stream.
    pub stream_prefix: String,
}

/// Port exposed by a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// Port the process listens on.
    pub container_port: u16,
    /// Port on the task's network interface.
    pub host_port: u16,
    /// Transport protocol.
    pub protocol: Protocol,
}

/// The single container embedded in a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Container name, used by explicit target registrations.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Resolved environment.
    pub environment: ProxyEnvironment,
    /// Exposed port.
    pub port_mapping: PortMapping,
    /// Log sink receiving the container's output, if any.
    pub logging: Option<EntityId>,
}

/// Immutable descriptor of one deployable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpecification {
    pub(crate) container: ContainerSpec,
}

impl TaskSpecification {
    /// The task's only container.
    #[must_use]
    pub const fn container(&self) -> &ContainerSpec {
        &self.container
    }

    /// Port the container listens on.
    #[must_use]
    pub const fn container_port(&self) -> u16 {
        self.container.port_mapping.container_port
    }
}

/// Desired-state declaration keeping copies of a task alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningService {
    /// Cluster the tasks run in.
    pub cluster: EntityId,
    /// Task being run.
    pub task: EntityId,
    /// Number of replicas.
    pub desired_count: u32,
    /// Attached security groups.
    pub security_groups: Vec<EntityId>,
    /// Container receiving load-balanced traffic.
    pub container_name: String,
    /// Port receiving load-balanced traffic.
    pub target_port: u16,
}

/// One ingress rule of a security group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    /// Admitted source addresses.
    pub source: Cidr,
    /// Admitted port.
    pub port: u16,
    /// Admitted protocol.
    pub protocol: Protocol,
}

/// Security group scoped to a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    /// Network the group belongs to.
    pub network: EntityId,
    /// Whether all egress is permitted.
    pub allow_all_outbound: bool,
    /// Ingress rules.
    pub ingress: Vec<IngressRule>,
}

/// Layer-4 or layer-7 load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    /// Network the balancer is placed in.
    pub network: EntityId,
    /// Layer the balancer operates at.
    pub kind: BalancerKind,
    /// Whether the balancer has a public address.
    pub internet_facing: bool,
}

/// Listener accepting traffic on a balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    /// Balancer the listener belongs to.
    pub load_balancer: EntityId,
    /// Exposed port.
    pub port: u16,
    /// Listener protocol.
    pub protocol: Protocol,
    /// Target group receiving traffic by default. Explicit registrations
    /// bind later and leave this unset.
    pub default_target: Option<EntityId>,
}

/// Target group implicitly bound to a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    /// Service whose tasks are the targets.
    pub service: EntityId,
    /// Port traffic is forwarded to.
    pub port: u16,
    /// Forwarding protocol.
    pub protocol: Protocol,
}

/// Late, explicit binding of a listener to a service's container port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRegistration {
    /// Listener forwarding the traffic.
    pub listener: EntityId,
    /// Service receiving the traffic.
    pub service: EntityId,
    /// Container receiving the traffic.
    pub container_name: String,
    /// Port traffic is forwarded to.
    pub container_port: u16,
    /// Forwarding protocol.
    pub protocol: Protocol,
}

/// Any declarable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Resource {
    /// See [`NetworkBoundary`].
    Network(NetworkBoundary),
    /// See [`ComputeCluster`].
    Cluster(ComputeCluster),
    /// See [`LogSink`].
    LogSink(LogSink),
    /// See [`TaskSpecification`].
    Task(TaskSpecification),
    /// See [`SecurityGroup`].
    SecurityGroup(SecurityGroup),
    /// See [`RunningService`].
    Service(RunningService),
    /// See [`LoadBalancer`].
    LoadBalancer(LoadBalancer),
    /// See [`Listener`].
    Listener(Listener),
    /// See [`TargetGroup`].
    TargetGroup(TargetGroup),
    /// See [`TargetRegistration`].
    TargetRegistration(TargetRegistration),
}

impl Resource {
    /// Kind of this entity.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Network(_) => EntityKind::Network,
            Self::Cluster(_) => EntityKind::Cluster,
            Self::LogSink(_) => EntityKind::LogSink,
            Self::Task(_) => EntityKind::Task,
            Self::SecurityGroup(_) => EntityKind::SecurityGroup,
            Self::Service(_) => EntityKind::Service,
            Self::LoadBalancer(_) => EntityKind::LoadBalancer,
            Self::Listener(_) => EntityKind::Listener,
            Self::TargetGroup(_) => EntityKind::TargetGroup,
            Self::TargetRegistration(_) => EntityKind::TargetRegistration,
        }
    }

    /// Every identifier this entity refers to, with the kind it must have.
    #[must_use]
    pub fn references(&self) -> Vec<(EntityKind, &EntityId)> {
        match self {
            Self::Network(_) | Self::LogSink(_) => Vec::new(),
            Self::Cluster(c) => vec![(EntityKind::Network, &c.network)],
            Self::Task(t) => t
                .container
                .logging
                .iter()
                .map(|id| (EntityKind::LogSink, id))
                .collect(),
            Self::SecurityGroup(g) => vec![(EntityKind::Network, &g.network)],
            Self::Service(s) => {
                let mut refs = vec![(EntityKind::Cluster, &s.cluster), (EntityKind::Task, &s.task)];
                refs.extend(
                    s.security_groups
                        .iter()
                        .map(|id| (EntityKind::SecurityGroup, id)),
                );
                refs
            }
            Self::LoadBalancer(lb) => vec![(EntityKind::Network, &lb.network)],
            Self::Listener(l) => {
                let mut refs = vec![(EntityKind::LoadBalancer, &l.load_balancer)];
                refs.extend(l.default_target.iter().map(|id| (EntityKind::TargetGroup, id)));
                refs
            }
            Self::TargetGroup(tg) => vec![(EntityKind::Service, &tg.service)],
            Self::TargetRegistration(r) => vec![
                (EntityKind::Listener, &r.listener),
                (EntityKind::Service, &r.service),
            ],
        }
    }

    /// Checks the invariants that involve this entity alone.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation naming `id` if an invariant fails.
    pub fn check_local(&self, id: &EntityId) -> Result<()> {
        let fail = |what: &str| -> Result<()> {
            Err(TopologyError::constraint(format!(
                "{} \"{id}\": {what}",
                self.kind()
            )))
        };
        match self {
            Self::Network(n) if n.max_azs == 0 => fail("must span at least one availability zone"),
            Self::LogSink(s) if s.retention_days == 0 => fail("retention must be at least one day"),
            Self::LogSink(s) if s.stream_prefix.is_empty() => fail("stream prefix is empty"),
            Self::Task(t) if t.container.port_mapping.container_port == 0 => {
                fail("container port must be non-zero")
            }
            Self::Task(t) if t.container.port_mapping.host_port != t.container_port() => {
                fail("host port must equal container port")
            }
            Self::Service(s) if s.desired_count == 0 => fail("desired count must be at least 1"),
            Self::SecurityGroup(g) if g.ingress.is_empty() => {
                fail("at least one ingress source is required")
            }
            Self::Listener(l) if l.port == 0 => fail("listener port must be non-zero"),
            _ => Ok(()),
        }
    }

    /// Returns the task, if this is one.
    #[must_use]
    pub const fn as_task(&self) -> Option<&TaskSpecification> {
        match self {
            Self::Task(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the service, if this is one.
    #[must_use]
    pub const fn as_service(&self) -> Option<&RunningService> {
        match self {
            Self::Service(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the security group, if this is one.
    #[must_use]
    pub const fn as_security_group(&self) -> Option<&SecurityGroup> {
        match self {
            Self::SecurityGroup(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the load balancer, if this is one.
    #[must_use]
    pub const fn as_load_balancer(&self) -> Option<&LoadBalancer> {
        match self {
            Self::LoadBalancer(lb) => Some(lb),
            _ => None,
        }
    }

    /// Returns the listener, if this is one.
    #[must_use]
    pub const fn as_listener(&self) -> Option<&Listener> {
        match self {
            Self::Listener(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the target group, if this is one.
    #[must_use]
    pub const fn as_target_group(&self) -> Option<&TargetGroup> {
        match self {
            Self::TargetGroup(tg) => Some(tg),
            _ => None,
        }
    }

    /// Returns the target registration, if this is one.
    #[must_use]
    pub const fn as_target_registration(&self) -> Option<&TargetRegistration> {
        match self {
            Self::TargetRegistration(r) => Some(r),
            _ => None,
        }
    }
}

impl From<NetworkBoundary> for Resource {
    fn from(value: NetworkBoundary) -> Self {
        Self::Network(value)
    }
}

impl From<ComputeCluster> for Resource {
    fn from(value: ComputeCluster) -> Self {
        Self::Cluster(value)
    }
}

impl From<LogSink> for Resource {
    fn from(value: LogSink) -> Self {
        Self::LogSink(value)
    }
}

impl From<TaskSpecification> for Resource {
    fn from(value: TaskSpecification) -> Self {
        Self::Task(value)
    }
}

impl From<SecurityGroup> for Resource {
    fn from(value: SecurityGroup) -> Self {
        Self::SecurityGroup(value)
    }
}

impl From<RunningService> for Resource {
    fn from(value: RunningService) -> Self {
        Self::Service(value)
    }
}

impl From<LoadBalancer> for Resource {
    fn from(value: LoadBalancer) -> Self {
        Self::LoadBalancer(value)
    }
}

impl From<Listener> for Resource {
    fn from(value: Listener) -> Self {
        Self::Listener(value)
    }
}

impl From<TargetGroup> for Resource {
    fn from(value: TargetGroup) -> Self {
        Self::TargetGroup(value)
    }
}

impl From<TargetRegistration> for Resource {
    fn from(value: TargetRegistration) -> Self {
        Self::TargetRegistration(value)
    }
}
