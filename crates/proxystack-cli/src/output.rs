//! Formatted output helpers for CLI commands.

use proxystack_topology::entity::Resource;

/// Replacement shown for sensitive values.
pub const REDACTED: &str = "********";

/// Returns `value`, or a fixed mask when it is sensitive.
#[must_use]
pub fn redact(value: &str, sensitive: bool) -> &str {
    if sensitive { REDACTED } else { value }
}

/// A horizontal rule of `width` box-drawing characters.
#[must_use]
pub fn rule(width: usize) -> String {
    "\u{2550}".repeat(width)
}

/// One-line summary of an entity's key attributes.
#[must_use]
pub fn describe(resource: &Resource) -> String {
    match resource {
        Resource::Network(n) => format!("azs: {}", n.max_azs),
        Resource::Cluster(c) => format!("network: {}", c.network),
        Resource::LogSink(s) => format!(
            "retention: {}d, prefix: {}",
            s.retention_days, s.stream_prefix
        ),
        Resource::Task(t) => {
            let c = t.container();
            format!(
                "image: {}, port: {}/{}, env: {} var(s)",
                c.image,
                c.port_mapping.container_port,
                c.port_mapping.protocol,
                c.environment.len()
            )
        }
        Resource::SecurityGroup(g) => {
            let sources: Vec<String> = g
                .ingress
                .iter()
                .map(|r| format!("{}:{}/{}", r.source, r.port, r.protocol))
                .collect();
            format!(
                "ingress: [{}], egress: {}",
                sources.join(", "),
                if g.allow_all_outbound { "all" } else { "none" }
            )
        }
        Resource::Service(s) => format!(
            "desired: {}, target: {}:{}",
            s.desired_count, s.container_name, s.target_port
        ),
        Resource::LoadBalancer(lb) => format!(
            "{} ({})",
            lb.kind,
            if lb.internet_facing {
                "internet-facing"
            } else {
                "internal"
            }
        ),
        Resource::Listener(l) => format!("port: {}/{}", l.port, l.protocol),
        Resource::TargetGroup(tg) => {
            format!("service: {}, port: {}/{}", tg.service, tg.port, tg.protocol)
        }
        Resource::TargetRegistration(r) => format!(
            "listener: {} -> {}:{}",
            r.listener, r.container_name, r.container_port
        ),
    }
}

#[cfg(test)]
mod tests {
    use proxystack_common::types::{BalancerKind, Protocol};
    use proxystack_topology::entity::{Listener, LoadBalancer};

    use super::*;

    #[test]
    fn redact_masks_sensitive_values_only() {
        assert_eq!(redact("hunter2", true), REDACTED);
        assert_eq!(redact("localhost", false), "localhost");
    }

    #[test]
    fn rule_has_requested_width() {
        assert_eq!(rule(4).chars().count(), 4);
    }

    #[test]
    fn describe_listener() {
        let listener = Resource::Listener(Listener {
            load_balancer: "Lb".into(),
            port: 6432,
            protocol: Protocol::Tcp,
            default_target: None,
        });
        assert_eq!(describe(&listener), "port: 6432/TCP");
    }

    #[test]
    fn describe_load_balancer() {
        let lb = Resource::LoadBalancer(LoadBalancer {
            network: "Vpc".into(),
            kind: BalancerKind::Network,
            internet_facing: true,
        });
        assert_eq!(describe(&lb), "network (internet-facing)");
    }
}
