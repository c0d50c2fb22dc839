//! The top-level proxy stack.
//!
//! [`ProxyStack::build`] declares the whole topology from a
//! [`StackConfig`], in dependency order: network, cluster, log sink, task,
//! security groups, service, traffic front. The result is validated before
//! it is returned.

use proxystack_common::config::{FrontStrategy, StackConfig};
use proxystack_common::constants;
use proxystack_common::env::ProxyEnvironment;
use proxystack_common::error::{DefaultWarning, Result, TopologyError};
use proxystack_common::types::EntityId;

use crate::entity::{ComputeCluster, LogSink, NetworkBoundary};
use crate::front::{self, TargetBinding, TrafficFront, TrafficFrontStrategy};
use crate::security;
use crate::service::ServiceProvisioner;
use crate::snapshot::TopologySnapshot;
use crate::task::TaskSpecBuilder;
use crate::topology::Topology;
use crate::validator;

/// Id of the virtual network.
pub const NETWORK_ID: &str = "ProxyVpc";
/// Id of the compute cluster.
pub const CLUSTER_ID: &str = "ProxyCluster";
/// Id of the log sink.
pub const LOG_SINK_ID: &str = "ProxyLogs";
/// Id of the task specification.
pub const TASK_ID: &str = "ProxyTaskDef";
/// Id of the running service.
pub const SERVICE_ID: &str = "ProxyService";

/// A fully declared and validated proxy stack.
#[derive(Debug, Clone)]
pub struct ProxyStack {
    name: String,
    topology: Topology,
    front: TrafficFront,
    environment: ProxyEnvironment,
    warnings: Vec<DefaultWarning>,
}

impl ProxyStack {
    /// Builds the stack with the strategy selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns the first configuration, referential, or constraint error.
    pub fn build(config: &StackConfig) -> Result<Self> {
        let strategy = front::strategy_for(config.strategy, config.ingress_sources.clone());
        Self::build_with(config, strategy.as_ref())
    }

    /// Builds the stack with an explicit strategy implementation.
    /// `config.strategy` is ignored; defaults such as logging follow
    /// `strategy.strategy()` instead.
    ///
    /// # Errors
    ///
    /// Returns the first configuration, referential, or constraint error.
    pub fn build_with(config: &StackConfig, strategy: &dyn TrafficFrontStrategy) -> Result<Self> {
        tracing::info!(
            stack = %config.stack_name,
            strategy = %strategy.strategy(),
            "building proxy stack"
        );

        let environment = config.resolve_environment()?;
        let mut topology = Topology::new();

        let network = topology.declare(
            NETWORK_ID,
            NetworkBoundary {
                max_azs: config.max_azs,
            },
        )?;
        let cluster = topology.declare(
            CLUSTER_ID,
            ComputeCluster {
                network: network.clone(),
            },
        )?;

        let mut task = TaskSpecBuilder::new(constants::CONTAINER_NAME)
            .image(&config.image)
            .environment(environment.clone())
            .container_port(constants::PROXY_PORT);
        if let Some(logging) = config.effective_logging_for(strategy.strategy()) {
            let sink = topology.declare(
                LOG_SINK_ID,
                LogSink {
                    retention_days: logging.retention_days,
                    stream_prefix: logging.stream_prefix,
                },
            )?;
            task = task.logging(sink);
        }
        let task = topology.declare(TASK_ID, task.build()?)?;

        let security_groups =
            strategy.declare_security(&mut topology, &network, constants::PROXY_PORT)?;
        if strategy.strategy() == FrontStrategy::Integrated && !security_groups.is_empty() {
            return Err(TopologyError::constraint(
                "the integrated strategy must not attach explicit security groups",
            ));
        }

        let service = ServiceProvisioner::new(cluster, task)
            .desired_count(config.desired_count)
            .security_groups(security_groups)
            .declare(&mut topology, SERVICE_ID)?;
        let front = strategy.declare_front(&mut topology, &network, &service)?;

        validator::validate(&topology)?;

        let mut warnings = security::open_ingress_warnings(&topology);
        warnings.extend(environment.default_credentials());
        for warning in &warnings {
            tracing::warn!(%warning, "insecure default in use");
        }

        Ok(Self {
            name: config.stack_name.clone(),
            topology,
            front,
            environment,
            warnings,
        })
    }

    /// Stack name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared topology.
    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The traffic front entities.
    #[must_use]
    pub const fn front(&self) -> &TrafficFront {
        &self.front
    }

    /// The environment handed to the proxy container.
    #[must_use]
    pub const fn environment(&self) -> &ProxyEnvironment {
        &self.environment
    }

    /// Insecure defaults in use.
    #[must_use]
    pub fn warnings(&self) -> &[DefaultWarning] {
        &self.warnings
    }

    /// Port the task's container listens on.
    #[must_use]
    pub fn container_port(&self) -> Option<u16> {
        self.topology
            .get(&EntityId::new(TASK_ID))
            .and_then(|r| r.as_task())
            .map(crate::entity::TaskSpecification::container_port)
    }

    /// Port the service's load-balanced traffic targets.
    #[must_use]
    pub fn service_target_port(&self) -> Option<u16> {
        self.topology
            .get(&EntityId::new(SERVICE_ID))
            .and_then(|r| r.as_service())
            .map(|s| s.target_port)
    }

    /// Port the front's listener accepts traffic on.
    #[must_use]
    pub fn listener_port(&self) -> Option<u16> {
        self.topology
            .get(&self.front.listener)
            .and_then(|r| r.as_listener())
            .map(|l| l.port)
    }

    /// Entity carrying the target binding of the front.
    #[must_use]
    pub const fn binding_entity(&self) -> &EntityId {
        match &self.front.binding {
            TargetBinding::Implicit { target_group } => target_group,
            TargetBinding::Explicit { registration } => registration,
        }
    }

    /// Creation order for an external provisioning engine.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation if the graph contains a cycle.
    pub fn deployment_order(&self) -> Result<Vec<EntityId>> {
        self.topology.deployment_order()
    }

    /// Captures a serializable snapshot of the stack.
    #[must_use]
    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot::capture(&self.name, &self.topology)
    }
}

#[cfg(test)]
mod tests {
    use proxystack_common::types::EntityKind;

    use super::*;

    #[test]
    fn default_config_builds_integrated_stack() {
        let stack = ProxyStack::build(&StackConfig::default()).expect("build");
        assert_eq!(stack.name(), constants::DEFAULT_STACK_NAME);
        assert_eq!(stack.front().strategy, FrontStrategy::Integrated);
        assert_eq!(stack.topology().count(EntityKind::LogSink), 0);
        assert_eq!(stack.topology().count(EntityKind::SecurityGroup), 0);
        assert_eq!(stack.container_port(), Some(constants::PROXY_PORT));
    }

    #[test]
    fn explicit_config_ships_logs_with_thirty_day_retention() {
        let config = StackConfig {
            strategy: FrontStrategy::Explicit,
            ..StackConfig::default()
        };
        let stack = ProxyStack::build(&config).expect("build");
        let sink = stack
            .topology()
            .get(&EntityId::new(LOG_SINK_ID))
            .expect("log sink");
        match sink {
            crate::entity::Resource::LogSink(s) => {
                assert_eq!(s.retention_days, 30);
                assert_eq!(s.stream_prefix, constants::DEFAULT_LOG_STREAM_PREFIX);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn strategy_instance_selects_logging_default() {
        let config = StackConfig::default();
        assert_eq!(config.strategy, FrontStrategy::Integrated);
        let stack =
            ProxyStack::build_with(&config, &front::ExplicitFront::default()).expect("build");
        assert_eq!(stack.topology().count(EntityKind::LogSink), 1);
        let task = stack
            .topology()
            .require_task(&EntityId::new(TASK_ID), "test")
            .expect("task");
        assert_eq!(task.container().logging, Some(EntityId::new(LOG_SINK_ID)));
    }

    #[test]
    fn zero_replicas_abort_the_build() {
        let config = StackConfig {
            desired_count: 0,
            ..StackConfig::default()
        };
        let err = ProxyStack::build(&config).unwrap_err();
        assert!(matches!(err, TopologyError::ConstraintViolation { .. }));
    }

    #[test]
    fn zero_zones_abort_the_build() {
        let config = StackConfig {
            max_azs: 0,
            ..StackConfig::default()
        };
        assert!(ProxyStack::build(&config).is_err());
    }

    #[test]
    fn malformed_environment_aborts_the_build() {
        let mut config = StackConfig::default();
        let _ = config
            .environment
            .insert("CS_DATABASE__PORT".into(), "not-a-port".into());
        let err = ProxyStack::build(&config).unwrap_err();
        assert!(matches!(err, TopologyError::ConstraintViolation { .. }));
    }

    #[test]
    fn explicit_strategy_with_empty_allow_list_is_rejected() {
        let config = StackConfig {
            strategy: FrontStrategy::Explicit,
            ingress_sources: Vec::new(),
            ..StackConfig::default()
        };
        assert!(ProxyStack::build(&config).is_err());
    }
}
