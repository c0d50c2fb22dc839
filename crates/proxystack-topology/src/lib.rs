//! # proxystack-topology
//!
//! Desired-state model of the proxy deployment.
//!
//! Handles:
//! - **Topology**: Arena of named entities with reference-by-identifier.
//! - **Graph**: Dependency graph and creation ordering.
//! - **Task / Service**: The single-container task and the service running it.
//! - **Security**: Security groups for the explicit traffic front.
//! - **Front**: The integrated and explicit traffic-front strategies.
//! - **Validator**: Cross-entity consistency checks (ports, bindings).
//! - **Stack**: End-to-end declaration from a `StackConfig`.
//! - **Snapshot**: Serializable dumps and structural diffs.
//!
//! # Example
//!
//! ```rust,no_run
//! use proxystack_common::config::StackConfig;
//! use proxystack_topology::stack::ProxyStack;
//!
//! let stack = ProxyStack::build(&StackConfig::default())?;
//! assert_eq!(stack.listener_port(), stack.container_port());
//! # Ok::<(), proxystack_common::error::TopologyError>(())
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod entity;
pub mod front;
pub mod graph;
pub mod security;
pub mod service;
pub mod snapshot;
pub mod stack;
pub mod task;
pub mod topology;
pub mod validator;
