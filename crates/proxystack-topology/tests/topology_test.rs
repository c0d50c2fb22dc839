//! End-to-end tests for proxy stack declaration.
//!
//! These tests build complete stacks from a `StackConfig` and check:
//! 1. Environment resolution (overrides, defaults, pass-through)
//! 2. Port consistency across task, service, and listener
//! 3. Strategy-specific wiring (implicit vs. explicit target binding)
//! 4. Security policy defaults and narrowing
//! 5. Creation ordering and dangling references
//! 6. Idempotence of repeated declarations

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::collections::BTreeMap;

use proxystack_common::config::{FrontStrategy, StackConfig};
use proxystack_common::env::PROXY_ENV_OPTIONS;
use proxystack_common::error::{DefaultWarning, TopologyError};
use proxystack_common::types::{BalancerKind, Cidr, EntityId, EntityKind, Protocol};
use proxystack_topology::entity::{ComputeCluster, NetworkBoundary, Resource, TargetRegistration};
use proxystack_topology::front::explicit::{LISTENER_ID, REGISTRATION_ID, SECURITY_GROUP_ID};
use proxystack_topology::front::{ExplicitFront, IntegratedFront, TargetBinding, TrafficFrontStrategy};
use proxystack_topology::snapshot::diff;
use proxystack_topology::stack::{
    CLUSTER_ID, LOG_SINK_ID, NETWORK_ID, ProxyStack, SERVICE_ID, TASK_ID,
};
use proxystack_topology::task::TaskSpecBuilder;
use proxystack_topology::topology::Topology;

const STRATEGIES: [FrontStrategy; 2] = [FrontStrategy::Integrated, FrontStrategy::Explicit];

fn config(strategy: FrontStrategy) -> StackConfig {
    StackConfig {
        strategy,
        use_process_env: false,
        ..StackConfig::default()
    }
}

fn build(strategy: FrontStrategy) -> ProxyStack {
    ProxyStack::build(&config(strategy)).expect("stack should build")
}

fn resource<'a>(stack: &'a ProxyStack, id: &str) -> &'a Resource {
    stack
        .topology()
        .get(&EntityId::new(id))
        .unwrap_or_else(|| panic!("{id} should be declared"))
}

// ── Environment ──────────────────────────────────────────────────────

#[test]
fn env_overrides_and_defaults_scenario() {
    let mut cfg = config(FrontStrategy::Integrated);
    let _ = cfg.environment.insert("DB_HOST".into(), "db.internal".into());
    let _ = cfg.environment.insert("DB_PORT".into(), "5432".into());

    let stack = ProxyStack::build(&cfg).expect("build");
    let task = resource(&stack, TASK_ID).as_task().expect("task");
    let env = &task.container().environment;

    assert_eq!(env.get("DB_HOST"), Some("db.internal"));
    assert_eq!(env.get("DB_PORT"), Some("5432"));
    for opt in PROXY_ENV_OPTIONS {
        assert_eq!(env.get(opt.key), Some(opt.default), "{}", opt.key);
    }
    assert_eq!(env.len(), PROXY_ENV_OPTIONS.len() + 2);
}

#[test]
fn env_equals_supplied_mapping_for_every_supplied_key() {
    let supplied: BTreeMap<String, String> = PROXY_ENV_OPTIONS
        .iter()
        .map(|opt| (opt.key.to_string(), format!("custom-{}", opt.key.len())))
        .filter(|(k, _)| k != "CS_DATABASE__PORT")
        .collect();
    let mut cfg = config(FrontStrategy::Explicit);
    cfg.environment = supplied.clone();

    let stack = ProxyStack::build(&cfg).expect("build");
    for (key, value) in &supplied {
        assert_eq!(stack.environment().get(key), Some(value.as_str()), "{key}");
    }
    assert_eq!(stack.environment().get("CS_DATABASE__PORT"), Some("5432"));
}

#[test]
fn default_credentials_are_warned_not_rejected() {
    let stack = build(FrontStrategy::Integrated);
    assert!(stack.warnings().contains(&DefaultWarning::DefaultCredential {
        key: "CS_PASSWORD".into()
    }));
    assert!(
        !stack
            .warnings()
            .iter()
            .any(|w| matches!(w, DefaultWarning::OpenIngress { .. }))
    );
}

// ── Ports ────────────────────────────────────────────────────────────

#[test]
fn port_is_identical_across_layers_for_both_strategies() {
    for strategy in STRATEGIES {
        let stack = build(strategy);
        let container = stack.container_port().expect("container port");
        assert_eq!(container, 6432, "{strategy}");
        assert_eq!(stack.service_target_port(), Some(container), "{strategy}");
        assert_eq!(stack.listener_port(), Some(container), "{strategy}");
    }
}

#[test]
fn both_strategies_share_task_and_service_fixtures() {
    let integrated = build(FrontStrategy::Integrated);
    let explicit = build(FrontStrategy::Explicit);

    let task_a = resource(&integrated, TASK_ID).as_task().expect("task");
    let task_b = resource(&explicit, TASK_ID).as_task().expect("task");
    assert_eq!(task_a.container().environment, task_b.container().environment);
    assert_eq!(task_a.container().port_mapping, task_b.container().port_mapping);
}

// ── Integrated strategy ──────────────────────────────────────────────

#[test]
fn integrated_front_binds_targets_implicitly() {
    let stack = build(FrontStrategy::Integrated);
    let topology = stack.topology();

    assert_eq!(topology.count(EntityKind::LoadBalancer), 1);
    assert_eq!(topology.count(EntityKind::Listener), 1);
    assert_eq!(topology.count(EntityKind::TargetGroup), 1);
    assert_eq!(topology.count(EntityKind::TargetRegistration), 0);
    assert_eq!(topology.count(EntityKind::SecurityGroup), 0);

    let front = stack.front();
    let lb = resource(&stack, front.load_balancer.as_str())
        .as_load_balancer()
        .expect("lb");
    assert_eq!(lb.kind, BalancerKind::Application);
    assert!(lb.internet_facing);

    let TargetBinding::Implicit { target_group } = &front.binding else {
        panic!("integrated binding should be implicit");
    };
    let listener = resource(&stack, front.listener.as_str())
        .as_listener()
        .expect("listener");
    assert_eq!(listener.default_target.as_ref(), Some(target_group));

    let service = resource(&stack, SERVICE_ID).as_service().expect("service");
    assert!(service.security_groups.is_empty());
    assert_eq!(service.desired_count, 1);
}

// ── Explicit strategy ────────────────────────────────────────────────

#[test]
fn explicit_front_has_single_open_ingress_rule() {
    let stack = build(FrontStrategy::Explicit);
    let topology = stack.topology();
    assert_eq!(topology.count(EntityKind::SecurityGroup), 1);

    let group = resource(&stack, SECURITY_GROUP_ID)
        .as_security_group()
        .expect("security group");
    assert!(group.allow_all_outbound);
    assert_eq!(group.ingress.len(), 1);
    let rule = group.ingress[0];
    assert_eq!(rule.port, 6432);
    assert_eq!(rule.protocol, Protocol::Tcp);
    assert_eq!(rule.source, Cidr::ANY_IPV4);

    assert!(stack.warnings().contains(&DefaultWarning::OpenIngress {
        security_group: SECURITY_GROUP_ID.into(),
        source: "0.0.0.0/0".into(),
        port: 6432,
    }));

    let service = resource(&stack, SERVICE_ID).as_service().expect("service");
    assert_eq!(service.security_groups, vec![EntityId::new(SECURITY_GROUP_ID)]);
}

#[test]
fn explicit_front_registers_service_by_container_name_and_port() {
    let stack = build(FrontStrategy::Explicit);
    let topology = stack.topology();
    assert_eq!(topology.count(EntityKind::TargetGroup), 0);
    assert_eq!(topology.count(EntityKind::TargetRegistration), 1);

    let lb = resource(&stack, stack.front().load_balancer.as_str())
        .as_load_balancer()
        .expect("lb");
    assert_eq!(lb.kind, BalancerKind::Network);
    assert!(lb.internet_facing);

    let listener = resource(&stack, LISTENER_ID).as_listener().expect("listener");
    assert_eq!(listener.protocol, Protocol::Tcp);
    assert!(listener.default_target.is_none());

    let registration = resource(&stack, REGISTRATION_ID)
        .as_target_registration()
        .expect("registration");
    assert_eq!(registration.service, EntityId::new(SERVICE_ID));
    assert_eq!(registration.container_name, "cipherstash-proxy");
    assert_eq!(registration.container_port, 6432);
    assert_eq!(stack.binding_entity(), &EntityId::new(REGISTRATION_ID));
}

#[test]
fn narrowed_ingress_replaces_open_default() {
    let cfg = StackConfig {
        strategy: FrontStrategy::Explicit,
        ingress_sources: vec!["10.0.0.0/8".parse().expect("cidr")],
        ..StackConfig::default()
    };
    let stack = ProxyStack::build(&cfg).expect("build");
    let group = resource(&stack, SECURITY_GROUP_ID)
        .as_security_group()
        .expect("security group");
    assert_eq!(group.ingress.len(), 1);
    assert!(!group.ingress[0].source.is_any());
    assert!(
        !stack
            .warnings()
            .iter()
            .any(|w| matches!(w, DefaultWarning::OpenIngress { .. }))
    );
}

#[test]
fn custom_strategy_instances_are_accepted() {
    let cfg = config(FrontStrategy::Integrated);
    let stack =
        ProxyStack::build_with(&cfg, &IntegratedFront::new("PublicProxy")).expect("integrated");
    assert_eq!(stack.front().listener.as_str(), "PublicProxy/PublicListener");

    let stack = ProxyStack::build_with(&cfg, &ExplicitFront::default()).expect("explicit");
    assert_eq!(stack.front().strategy, FrontStrategy::Explicit);
    assert_eq!(stack.topology().count(EntityKind::LogSink), 1);
}

// ── Ordering ─────────────────────────────────────────────────────────

#[test]
fn deployment_order_follows_dependency_chain() {
    let stack = build(FrontStrategy::Explicit);
    let order = stack.deployment_order().expect("order");
    assert_eq!(order.len(), stack.topology().len());
    let pos = |id: &str| {
        order
            .iter()
            .position(|e| e.as_str() == id)
            .unwrap_or_else(|| panic!("{id} missing from {order:?}"))
    };
    assert!(pos(NETWORK_ID) < pos(CLUSTER_ID));
    assert!(pos(CLUSTER_ID) < pos(SERVICE_ID));
    assert!(pos(LOG_SINK_ID) < pos(TASK_ID));
    assert!(pos(TASK_ID) < pos(SERVICE_ID));
    assert!(pos(SECURITY_GROUP_ID) < pos(SERVICE_ID));
    assert!(pos(SERVICE_ID) < pos(REGISTRATION_ID));
    assert!(pos(LISTENER_ID) < pos(REGISTRATION_ID));
}

#[test]
fn registration_before_service_is_referential_error() {
    let mut topology = Topology::new();
    let vpc = topology
        .declare("Vpc", NetworkBoundary { max_azs: 2 })
        .expect("vpc");
    let _ = topology
        .declare("Cluster", ComputeCluster { network: vpc.clone() })
        .expect("cluster");
    let _ = topology
        .declare("TaskDef", TaskSpecBuilder::default().build().expect("task"))
        .expect("task");

    let explicit = ExplicitFront::default();
    let err = explicit
        .declare_front(&mut topology, &vpc, &EntityId::new("Service"))
        .unwrap_err();
    assert!(matches!(err, TopologyError::Referential { .. }), "got: {err}");

    let err = topology
        .declare(
            "Targets",
            TargetRegistration {
                listener: "Listener".into(),
                service: "Service".into(),
                container_name: "cipherstash-proxy".into(),
                container_port: 6432,
                protocol: Protocol::Tcp,
            },
        )
        .unwrap_err();
    assert!(matches!(err, TopologyError::Referential { .. }), "got: {err}");
    assert_eq!(topology.count(EntityKind::LoadBalancer), 0);
}

// ── Idempotence ──────────────────────────────────────────────────────

#[test]
fn repeated_declaration_is_structurally_identical() {
    for strategy in STRATEGIES {
        let a = build(strategy).snapshot();
        let b = build(strategy).snapshot();
        assert_eq!(a.entities.len(), b.entities.len());
        assert_eq!(a, b, "{strategy}");
        assert!(diff(&a, &b).is_empty());
        assert_eq!(
            a.to_json().expect("json"),
            b.to_json().expect("json"),
            "{strategy}"
        );
    }
}

#[test]
fn switching_strategy_is_visible_in_diff() {
    let integrated = build(FrontStrategy::Integrated).snapshot();
    let explicit = build(FrontStrategy::Explicit).snapshot();
    let changes = diff(&integrated, &explicit);
    let rendered: Vec<String> = changes.iter().map(ToString::to_string).collect();
    assert!(rendered.contains(&format!("+ security-group {SECURITY_GROUP_ID}")), "{rendered:?}");
    assert!(rendered.contains(&format!("~ service {}", SERVICE_ID)), "{rendered:?}");
    assert!(
        rendered.iter().any(|r| r.starts_with("- load-balancer")),
        "{rendered:?}"
    );
}
