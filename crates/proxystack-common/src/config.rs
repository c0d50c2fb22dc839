//! Stack configuration model.
//!
//! A [`StackConfig`] carries every input of a topology declaration. It can
//! be built in code or loaded from a YAML document; every field has a
//! documented default, so an empty document describes the stock stack.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::env::{DatabaseCoordinates, ProxyEnvironment};
use crate::error::{Result, TopologyError};
use crate::types::Cidr;

/// Which traffic-front strategy the stack is built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontStrategy {
    /// Application load balancer created by one composite declaration.
    #[default]
    Integrated,
    /// Network load balancer with an explicit target registration and
    /// security group.
    Explicit,
}

impl fmt::Display for FrontStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integrated => write!(f, "integrated"),
            Self::Explicit => write!(f, "explicit"),
        }
    }
}

impl FromStr for FrontStrategy {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "integrated" => Ok(Self::Integrated),
            "explicit" => Ok(Self::Explicit),
            other => Err(TopologyError::Config {
                message: format!("unknown strategy \"{other}\" (expected integrated or explicit)"),
            }),
        }
    }
}

/// Log delivery settings for the proxy container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// How long log events are kept.
    pub retention_days: u32,
    /// Prefix of every log stream.
    pub stream_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            retention_days: constants::DEFAULT_LOG_RETENTION_DAYS,
            stream_prefix: constants::DEFAULT_LOG_STREAM_PREFIX.to_string(),
        }
    }
}

/// Root configuration of a proxy stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackConfig {
    /// Name of the top-level stack.
    pub stack_name: String,
    /// Container image reference.
    pub image: String,
    /// Availability zones spanned by the network.
    pub max_azs: u8,
    /// Task replicas kept alive by the service.
    pub desired_count: u32,
    /// Traffic-front strategy.
    pub strategy: FrontStrategy,
    /// Sources admitted by the explicit strategy's security group.
    pub ingress_sources: Vec<Cidr>,
    /// Log delivery; `None` selects the strategy default.
    pub logging: Option<LoggingConfig>,
    /// Environment overrides handed to the proxy.
    pub environment: BTreeMap<String, String>,
    /// Upstream database coordinates, flattened into `CS_DATABASE__*`.
    pub database: DatabaseCoordinates,
    /// Whether recognized options are read from the deploying process's
    /// environment before falling back to defaults. On unless disabled.
    pub use_process_env: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_name: constants::DEFAULT_STACK_NAME.to_string(),
            image: constants::DEFAULT_IMAGE.to_string(),
            max_azs: constants::DEFAULT_MAX_AZS,
            desired_count: constants::DEFAULT_DESIRED_COUNT,
            strategy: FrontStrategy::default(),
            ingress_sources: vec![Cidr::ANY_IPV4],
            logging: None,
            environment: BTreeMap::new(),
            database: DatabaseCoordinates::default(),
            use_process_env: true,
        }
    }
}

impl StackConfig {
    /// Parses a configuration from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid YAML or names an
    /// unknown field.
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(input)?)
    }

    /// Loads a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading stack configuration");
        let content = std::fs::read_to_string(path).map_err(|e| TopologyError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Logging settings after applying the default of the configured
    /// strategy.
    #[must_use]
    pub fn effective_logging(&self) -> Option<LoggingConfig> {
        self.effective_logging_for(self.strategy)
    }

    /// Logging settings after applying the default of `strategy`: the
    /// explicit strategy always ships logs, the integrated one only when
    /// asked.
    #[must_use]
    pub fn effective_logging_for(&self, strategy: FrontStrategy) -> Option<LoggingConfig> {
        match (&self.logging, strategy) {
            (Some(logging), _) => Some(logging.clone()),
            (None, FrontStrategy::Explicit) => Some(LoggingConfig::default()),
            (None, FrontStrategy::Integrated) => None,
        }
    }

    /// Merges `environment` and the flattened `database` section.
    ///
    /// # Errors
    ///
    /// Returns an error if both set the same key.
    pub fn environment_overrides(&self) -> Result<BTreeMap<String, String>> {
        let mut overrides = self.environment.clone();
        for (key, value) in self.database.flatten() {
            if overrides.contains_key(&key) {
                return Err(TopologyError::Config {
                    message: format!("{key} is set both in environment and in database"),
                });
            }
            let _ = overrides.insert(key, value);
        }
        Ok(overrides)
    }

    /// Resolves the proxy environment against the option table.
    ///
    /// # Errors
    ///
    /// Returns an error if the overrides conflict or are malformed.
    pub fn resolve_environment(&self) -> Result<ProxyEnvironment> {
        self.resolve_environment_with(|key| std::env::var(key).ok())
    }

    /// Resolves the proxy environment, reading unset recognized options
    /// through `lookup` when `use_process_env` is on.
    ///
    /// # Errors
    ///
    /// Returns an error if the overrides conflict or are malformed.
    pub fn resolve_environment_with<F>(&self, lookup: F) -> Result<ProxyEnvironment>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides = self.environment_overrides()?;
        if self.use_process_env {
            ProxyEnvironment::resolve_with(&overrides, lookup)
        } else {
            ProxyEnvironment::resolve(&overrides)
        }
    }
}
