//! Environment configuration handed to the proxy container.
//!
//! Every option the proxy recognizes is listed once, with its documented
//! default, in [`PROXY_ENV_OPTIONS`]. Resolution walks that table:
//! explicit overrides win, then (optionally) the deploying process's
//! environment, then the default. Keys outside the table are passed
//! through untouched.
//!
//! Nested settings are flattened as `CS_<SECTION>__<FIELD>`, e.g.
//! `CS_DATABASE__HOST`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{ENV_NESTED_SEPARATOR, ENV_PREFIX};
use crate::error::{DefaultWarning, Result, TopologyError};

/// One recognized proxy environment option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvOption {
    /// Variable name as seen by the container.
    pub key: &'static str,
    /// Value used when the option is not supplied.
    pub default: &'static str,
    /// Short human-readable description.
    pub description: &'static str,
    /// Whether the value is a credential (redacted in output, warned when
    /// left at its default).
    pub sensitive: bool,
}

/// Key of the database port option, validated as a TCP port.
pub const DATABASE_PORT_KEY: &str = "CS_DATABASE__PORT";

/// The resolution table: every recognized option and its default.
pub const PROXY_ENV_OPTIONS: &[EnvOption] = &[
    EnvOption {
        key: "CS_USERNAME",
        default: "postgres",
        description: "username clients use to authenticate to the proxy",
        sensitive: true,
    },
    EnvOption {
        key: "CS_PASSWORD",
        default: "password",
        description: "password clients use to authenticate to the proxy",
        sensitive: true,
    },
    EnvOption {
        key: "CS_WORKSPACE_ID",
        default: "workspace",
        description: "CipherStash workspace identifier",
        sensitive: false,
    },
    EnvOption {
        key: "CS_CLIENT_ACCESS_KEY",
        default: "1234567890",
        description: "CipherStash client access key",
        sensitive: true,
    },
    EnvOption {
        key: "CS_DATABASE__NAME",
        default: "database",
        description: "name of the upstream database",
        sensitive: false,
    },
    EnvOption {
        key: "CS_DATABASE__HOST",
        default: "localhost",
        description: "host of the upstream database",
        sensitive: false,
    },
    EnvOption {
        key: DATABASE_PORT_KEY,
        default: "5432",
        description: "port of the upstream database",
        sensitive: false,
    },
    EnvOption {
        key: "CS_DATABASE__USERNAME",
        default: "postgres",
        description: "username the proxy uses against the upstream database",
        sensitive: true,
    },
    EnvOption {
        key: "CS_DATABASE__PASSWORD",
        default: "password",
        description: "password the proxy uses against the upstream database",
        sensitive: true,
    },
];

/// Returns the table entry for `key`, if it is a recognized option.
#[must_use]
pub fn lookup_option(key: &str) -> Option<&'static EnvOption> {
    PROXY_ENV_OPTIONS.iter().find(|opt| opt.key == key)
}

/// Builds a flattened key for a nested setting, e.g.
/// `nested_key("database", "host") == "CS_DATABASE__HOST"`.
#[must_use]
pub fn nested_key(section: &str, field: &str) -> String {
    format!(
        "{ENV_PREFIX}{}{ENV_NESTED_SEPARATOR}{}",
        section.to_uppercase(),
        field.to_uppercase()
    )
}

/// Upstream database coordinates, supplied as a nested section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseCoordinates {
    /// Database host.
    pub host: Option<String>,
    /// Database port.
    pub port: Option<u16>,
    /// Database name.
    pub name: Option<String>,
    /// Database username.
    pub username: Option<String>,
    /// Database password.
    pub password: Option<String>,
}

impl DatabaseCoordinates {
    /// Flattens the supplied fields into `CS_DATABASE__*` overrides.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let fields = [
            ("host", self.host.clone()),
            ("port", self.port.map(|p| p.to_string())),
            ("name", self.name.clone()),
            ("username", self.username.clone()),
            ("password", self.password.clone()),
        ];
        fields
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (nested_key("database", field), v)))
            .collect()
    }
}

/// The fully resolved environment of the proxy container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyEnvironment {
    vars: BTreeMap<String, String>,
}

impl ProxyEnvironment {
    /// Resolves `overrides` against the table, using defaults for every
    /// recognized key that is absent.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation if the map is malformed.
    pub fn resolve(overrides: &BTreeMap<String, String>) -> Result<Self> {
        Self::resolve_with(overrides, |_| None)
    }

    /// Resolves `overrides` with a custom lookup for recognized keys.
    ///
    /// Precedence is override, then a non-empty `lookup` value, then the
    /// documented default. An empty looked-up value counts as unset.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation if the map is malformed.
    pub fn resolve_with<F>(overrides: &BTreeMap<String, String>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut vars = BTreeMap::new();
        for option in PROXY_ENV_OPTIONS {
            let value = lookup(option.key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| option.default.to_string());
            let _ = vars.insert(option.key.to_string(), value);
        }
        for (key, value) in overrides {
            if lookup_option(key).is_none() {
                tracing::debug!(key = %key, "passing through unrecognized environment key");
            }
            let _ = vars.insert(key.clone(), value.clone());
        }

        let env = Self { vars };
        env.validate()?;
        Ok(env)
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in &self.vars {
            if !is_valid_key(key) {
                return Err(TopologyError::constraint(format!(
                    "environment key \"{key}\" must match [A-Z_][A-Z0-9_]*"
                )));
            }
            if value.contains('\0') {
                return Err(TopologyError::constraint(format!(
                    "environment value for {key} contains a NUL byte"
                )));
            }
        }
        if let Some(port) = self.vars.get(DATABASE_PORT_KEY) {
            match port.parse::<u16>() {
                Ok(p) if p != 0 => {}
                _ => {
                    return Err(TopologyError::constraint(format!(
                        "{DATABASE_PORT_KEY} must be a TCP port in 1..=65535, got \"{port}\""
                    )));
                }
            }
        }
        Ok(())
    }

    /// Returns the value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Returns every variable, sorted by key.
    #[must_use]
    pub const fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` if no variables are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Lists sensitive options still holding their placeholder default.
    #[must_use]
    pub fn default_credentials(&self) -> Vec<DefaultWarning> {
        PROXY_ENV_OPTIONS
            .iter()
            .filter(|opt| opt.sensitive && self.get(opt.key) == Some(opt.default))
            .map(|opt| DefaultWarning::DefaultCredential {
                key: opt.key.to_string(),
            })
            .collect()
    }
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
