//! Domain primitive types used across the proxystack workspace.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;

/// Identifier of one entity in a topology declaration.
///
/// Identifiers are unique within a topology and stable across repeated
/// declarations of the same stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Creates a new entity ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Kind of a declared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// Isolated virtual network.
    Network,
    /// Serverless compute cluster.
    Cluster,
    /// Log group receiving container output.
    LogSink,
    /// Single-container task descriptor.
    Task,
    /// Network security group.
    SecurityGroup,
    /// Desired-count service running a task.
    Service,
    /// Layer-4 or layer-7 load balancer.
    LoadBalancer,
    /// Listener on a load balancer.
    Listener,
    /// Target group implicitly bound to a service.
    TargetGroup,
    /// Explicit binding of a listener to a service's container port.
    TargetRegistration,
}

impl EntityKind {
    /// Returns the lowercase name used in messages and plans.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Cluster => "cluster",
            Self::LogSink => "log-sink",
            Self::Task => "task",
            Self::SecurityGroup => "security-group",
            Self::Service => "service",
            Self::LoadBalancer => "load-balancer",
            Self::Listener => "listener",
            Self::TargetGroup => "target-group",
            Self::TargetRegistration => "target-registration",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport or application protocol of a port, listener, or rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// Raw TCP.
    Tcp,
    /// HTTP, terminated by an application load balancer.
    Http,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Http => write!(f, "HTTP"),
        }
    }
}

/// Layer at which a load balancer operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancerKind {
    /// Layer-7 application load balancer.
    Application,
    /// Layer-4 network load balancer.
    Network,
}

impl fmt::Display for BalancerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application => write!(f, "application"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// An IPv4 CIDR block used as the source of an ingress rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    address: Ipv4Addr,
    prefix: u8,
}

impl Cidr {
    /// Every IPv4 address (`0.0.0.0/0`).
    pub const ANY_IPV4: Self = Self {
        address: Ipv4Addr::UNSPECIFIED,
        prefix: 0,
    };

    /// Creates a CIDR block from an address and prefix length. Host bits
    /// are cleared, so `10.1.2.3/8` becomes `10.0.0.0/8`.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is longer than 32 bits.
    pub fn new(address: Ipv4Addr, prefix: u8) -> crate::error::Result<Self> {
        if prefix > 32 {
            return Err(TopologyError::Config {
                message: format!("CIDR prefix /{prefix} is longer than 32 bits"),
            });
        }
        let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
        Ok(Self {
            address: Ipv4Addr::from(u32::from(address) & mask),
            prefix,
        })
    }

    /// Returns `true` if this block admits every IPv4 address.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        self.prefix == 0
    }

    /// Returns the network address.
    #[must_use]
    pub const fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// Returns the prefix length.
    #[must_use]
    pub const fn prefix(&self) -> u8 {
        self.prefix
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix)
    }
}

impl FromStr for Cidr {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TopologyError::Config {
            message: format!("invalid IPv4 CIDR block: \"{s}\""),
        };
        let (address, prefix) = s.trim().split_once('/').ok_or_else(invalid)?;
        let address: Ipv4Addr = address.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
        Self::new(address, prefix)
    }
}

impl TryFrom<String> for Cidr {
    type Error = TopologyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cidr> for String {
    fn from(value: Cidr) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_ipv4_displays_as_open_block() {
        assert_eq!(Cidr::ANY_IPV4.to_string(), crate::constants::ANY_IPV4_CIDR);
        assert!(Cidr::ANY_IPV4.is_any());
    }

    #[test]
    fn parses_private_block() {
        let cidr: Cidr = "10.0.0.0/16".parse().expect("valid cidr");
        assert_eq!(cidr.address(), Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(cidr.prefix(), 16);
        assert!(!cidr.is_any());
    }

    #[test]
    fn host_bits_are_masked() {
        let cidr: Cidr = "10.1.2.3/8".parse().expect("valid cidr");
        assert_eq!(cidr.to_string(), "10.0.0.0/8");
        assert_eq!(cidr, "10.0.0.0/8".parse().expect("valid cidr"));

        let host: Cidr = "192.168.1.7/32".parse().expect("valid cidr");
        assert_eq!(host.address(), Ipv4Addr::new(192, 168, 1, 7));
    }

    #[test]
    fn zero_prefix_normalizes_to_any_ipv4() {
        let cidr: Cidr = "10.0.0.0/0".parse().expect("valid cidr");
        assert!(cidr.is_any());
        assert_eq!(cidr, Cidr::ANY_IPV4);
        assert_eq!(cidr.to_string(), "0.0.0.0/0");
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = "10.0.0.1".parse::<Cidr>().unwrap_err();
        assert!(err.to_string().contains("10.0.0.1"));
    }

    #[test]
    fn rejects_oversized_prefix() {
        assert!("10.0.0.0/33".parse::<Cidr>().is_err());
    }

    #[test]
    fn cidr_serializes_as_string() {
        let json = serde_json::to_string(&Cidr::ANY_IPV4).expect("serialize");
        assert_eq!(json, "\"0.0.0.0/0\"");
        let back: Cidr = serde_json::from_str("\"192.168.1.0/24\"").expect("deserialize");
        assert_eq!(back.prefix(), 24);
    }

    #[test]
    fn entity_kind_uses_kebab_case() {
        assert_eq!(EntityKind::TargetRegistration.to_string(), "target-registration");
        let json = serde_json::to_string(&EntityKind::LogSink).expect("serialize");
        assert_eq!(json, "\"log-sink\"");
    }
}
