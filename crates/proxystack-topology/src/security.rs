//! Security group management for the explicit traffic front.
//!
//! The stock allow-list admits every IPv4 source. That default is kept on
//! purpose and reported through [`open_ingress_warnings`]; callers narrow it
//! with their own source list.

use proxystack_common::error::{DefaultWarning, Result, TopologyError};
use proxystack_common::types::{Cidr, EntityId, EntityKind, Protocol};

use crate::entity::{IngressRule, SecurityGroup};
use crate::topology::Topology;

/// Default ingress allow-list: any IPv4 address.
#[must_use]
pub fn default_ingress_sources() -> Vec<Cidr> {
    vec![Cidr::ANY_IPV4]
}

/// Declares a security group in `network` with open egress and one TCP
/// ingress rule on `port` per source.
///
/// # Errors
///
/// Returns a constraint violation if `sources` is empty, and a referential
/// error if `network` is not a declared network.
pub fn declare_security_group(
    topology: &mut Topology,
    id: impl Into<EntityId>,
    network: &EntityId,
    port: u16,
    sources: &[Cidr],
) -> Result<EntityId> {
    let id = id.into();
    if sources.is_empty() {
        return Err(TopologyError::constraint(format!(
            "security group \"{id}\" needs at least one ingress source"
        )));
    }

    let mut ingress: Vec<IngressRule> = Vec::with_capacity(sources.len());
    for &source in sources {
        let rule = IngressRule {
            source,
            port,
            protocol: Protocol::Tcp,
        };
        if !ingress.contains(&rule) {
            ingress.push(rule);
        }
    }

    topology.declare(
        id,
        SecurityGroup {
            network: network.clone(),
            allow_all_outbound: true,
            ingress,
        },
    )
}

/// Lists every ingress rule in `topology` that admits any address.
#[must_use]
pub fn open_ingress_warnings(topology: &Topology) -> Vec<DefaultWarning> {
    topology
        .of_kind(EntityKind::SecurityGroup)
        .filter_map(|(id, r)| r.as_security_group().map(|g| (id, g)))
        .flat_map(|(id, group)| {
            group
                .ingress
                .iter()
                .filter(|rule| rule.source.is_any())
                .map(move |rule| DefaultWarning::OpenIngress {
                    security_group: id.to_string(),
                    source: rule.source.to_string(),
                    port: rule.port,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::NetworkBoundary;

    fn network() -> (Topology, EntityId) {
        let mut topology = Topology::new();
        let vpc = topology
            .declare("Vpc", NetworkBoundary { max_azs: 2 })
            .expect("vpc");
        (topology, vpc)
    }

    #[test]
    fn default_sources_yield_single_open_rule() {
        let (mut topology, vpc) = network();
        let sg = declare_security_group(&mut topology, "Sg", &vpc, 6432, &default_ingress_sources())
            .expect("declare");
        let group = topology
            .get(&sg)
            .and_then(|r| r.as_security_group())
            .expect("group");
        assert!(group.allow_all_outbound);
        assert_eq!(
            group.ingress,
            vec![IngressRule {
                source: Cidr::ANY_IPV4,
                port: 6432,
                protocol: Protocol::Tcp,
            }]
        );

        let warnings = open_ingress_warnings(&topology);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0],
            DefaultWarning::OpenIngress {
                security_group: "Sg".into(),
                source: "0.0.0.0/0".into(),
                port: 6432,
            }
        );
    }

    #[test]
    fn narrowed_sources_produce_no_warning() {
        let (mut topology, vpc) = network();
        let sources: Vec<Cidr> = vec![
            "10.0.0.0/8".parse().expect("cidr"),
            "10.0.0.0/8".parse().expect("cidr"),
            "172.16.0.0/12".parse().expect("cidr"),
        ];
        let sg = declare_security_group(&mut topology, "Sg", &vpc, 6432, &sources).expect("declare");
        let group = topology
            .get(&sg)
            .and_then(|r| r.as_security_group())
            .expect("group");
        assert_eq!(group.ingress.len(), 2);
        assert!(open_ingress_warnings(&topology).is_empty());
    }

    #[test]
    fn empty_sources_are_rejected() {
        let (mut topology, vpc) = network();
        let err = declare_security_group(&mut topology, "Sg", &vpc, 6432, &[]).unwrap_err();
        assert!(matches!(err, TopologyError::ConstraintViolation { .. }));
    }

    #[test]
    fn undeclared_network_is_referential_error() {
        let mut topology = Topology::new();
        let err = declare_security_group(
            &mut topology,
            "Sg",
            &"Vpc".into(),
            6432,
            &default_ingress_sources(),
        )
        .unwrap_err();
        assert!(matches!(err, TopologyError::Referential { .. }));
    }
}
