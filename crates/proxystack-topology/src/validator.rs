//! Static analysis of a declared topology.
//!
//! Declaration already guarantees that references resolve. Validation
//! checks the invariants spanning several entities, before anything is
//! handed to a provisioning engine.

use proxystack_common::error::{Result, TopologyError};
use proxystack_common::types::{EntityId, EntityKind};

use crate::entity::RunningService;
use crate::topology::Topology;

/// Validates a topology for cross-entity consistency.
///
/// # Checks performed
///
/// 1. Every entity satisfies its local invariants.
/// 2. Every service targets its task's container by name and port.
/// 3. Every listener forwards to at least one service, and the listener
///    port, target port, and container port agree.
/// 4. Every ingress rule of a service's security groups admits the
///    service's port.
/// 5. The dependency graph is acyclic.
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate(topology: &Topology) -> Result<()> {
    tracing::info!(entities = topology.len(), "validating topology");
    for (id, resource) in topology.iter() {
        resource.check_local(id)?;
    }
    check_service_targets(topology)?;
    check_listener_bindings(topology)?;
    check_security_rules(topology)?;
    let _ = topology.deployment_order()?;
    Ok(())
}

fn services(topology: &Topology) -> impl Iterator<Item = (&EntityId, &RunningService)> {
    topology
        .of_kind(EntityKind::Service)
        .filter_map(|(id, r)| r.as_service().map(|s| (id, s)))
}

fn check_service_targets(topology: &Topology) -> Result<()> {
    for (id, service) in services(topology) {
        let referrer = format!("service \"{id}\"");
        let task = topology.require_task(&service.task, &referrer)?;
        if task.container().name != service.container_name {
            return Err(TopologyError::Referential {
                referrer,
                expected: "container",
                id: service.container_name.clone(),
                reason: format!("task \"{}\" has no container by that name", service.task),
            });
        }
        if task.container_port() != service.target_port {
            return Err(TopologyError::constraint(format!(
                "service \"{id}\" targets port {} but task \"{}\" exposes {}",
                service.target_port,
                service.task,
                task.container_port()
            )));
        }
    }
    Ok(())
}

fn check_listener_bindings(topology: &Topology) -> Result<()> {
    for (id, resource) in topology.of_kind(EntityKind::Listener) {
        let Some(listener) = resource.as_listener() else {
            continue;
        };
        let referrer = format!("listener \"{id}\"");
        let mut bound = 0usize;

        if let Some(tg_id) = &listener.default_target {
            let tg = topology
                .get(tg_id)
                .and_then(|r| r.as_target_group())
                .ok_or_else(|| TopologyError::Referential {
                    referrer: referrer.clone(),
                    expected: EntityKind::TargetGroup.as_str(),
                    id: tg_id.to_string(),
                    reason: "not declared".into(),
                })?;
            let service = topology.require_service(&tg.service, &referrer)?;
            check_port(id, listener.port, tg_id, tg.port, service)?;
            bound += 1;
        }

        for (reg_id, reg) in topology
            .of_kind(EntityKind::TargetRegistration)
            .filter_map(|(rid, r)| r.as_target_registration().map(|reg| (rid, reg)))
            .filter(|(_, reg)| &reg.listener == id)
        {
            let service = topology.require_service(&reg.service, &referrer)?;
            if reg.container_name != service.container_name {
                return Err(TopologyError::Referential {
                    referrer: format!("target-registration \"{reg_id}\""),
                    expected: "container",
                    id: reg.container_name.clone(),
                    reason: format!("service \"{}\" runs \"{}\"", reg.service, service.container_name),
                });
            }
            check_port(id, listener.port, reg_id, reg.container_port, service)?;
            bound += 1;
        }

        if bound == 0 {
            return Err(TopologyError::constraint(format!(
                "listener \"{id}\" forwards to no service"
            )));
        }
    }
    Ok(())
}

fn check_port(
    listener: &EntityId,
    listener_port: u16,
    target: &EntityId,
    target_port: u16,
    service: &RunningService,
) -> Result<()> {
    if listener_port == target_port && target_port == service.target_port {
        return Ok(());
    }
    Err(TopologyError::constraint(format!(
        "port mismatch: listener \"{listener}\" on {listener_port}, \"{target}\" forwards to {target_port}, service targets {}",
        service.target_port
    )))
}

fn check_security_rules(topology: &Topology) -> Result<()> {
    for (id, service) in services(topology) {
        for sg_id in &service.security_groups {
            let Some(group) = topology.get(sg_id).and_then(|r| r.as_security_group()) else {
                continue;
            };
            if let Some(rule) = group.ingress.iter().find(|r| r.port != service.target_port) {
                return Err(TopologyError::constraint(format!(
                    "security group \"{sg_id}\" admits port {} but service \"{id}\" listens on {}",
                    rule.port, service.target_port
                )));
            }
        }
    }
    Ok(())
}
