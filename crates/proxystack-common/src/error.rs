//! Unified error types for the proxystack workspace.
//!
//! Fatal, definition-time failures are [`TopologyError`]s. Insecure
//! defaults are not errors: they are reported as [`DefaultWarning`]s next
//! to a successfully built topology.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// An entity references something that has not been declared, or that
    /// is of the wrong kind.
    #[error("{referrer} references {expected} \"{id}\": {reason}")]
    Referential {
        /// Entity holding the dangling reference.
        referrer: String,
        /// Kind of entity the reference was expected to point at.
        expected: &'static str,
        /// Identifier that could not be resolved.
        id: String,
        /// Why the reference is invalid.
        reason: String,
    },

    /// A topology invariant does not hold.
    #[error("constraint violation: {message}")]
    ConstraintViolation {
        /// Description of the violated invariant.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// A YAML configuration document could not be parsed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },
}

impl TopologyError {
    /// Shorthand for a [`TopologyError::ConstraintViolation`].
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// A non-fatal use of an insecure default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefaultWarning {
    /// An ingress rule admits traffic from any address.
    OpenIngress {
        /// Security group carrying the rule.
        security_group: String,
        /// Source CIDR of the rule.
        source: String,
        /// Port admitted by the rule.
        port: u16,
    },
    /// A credential was left at its documented placeholder.
    DefaultCredential {
        /// Environment key holding the placeholder.
        key: String,
    },
}

impl fmt::Display for DefaultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenIngress {
                security_group,
                source,
                port,
            } => write!(
                f,
                "security group \"{security_group}\" admits port {port} from {source}; narrow ingress_sources before production use"
            ),
            Self::DefaultCredential { key } => {
                write!(f, "{key} is set to its default placeholder value")
            }
        }
    }
}
