//! System-wide constants and defaults.

/// The single TCP port exposed end-to-end, from listener to container.
pub const PROXY_PORT: u16 = 6432;

/// Container image run by every task.
pub const DEFAULT_IMAGE: &str = "cipherstash/cipherstash-proxy:latest";

/// Name of the single container embedded in the task.
pub const CONTAINER_NAME: &str = "cipherstash-proxy";

/// Default name of the top-level stack.
pub const DEFAULT_STACK_NAME: &str = "CipherstashProxyStack";

/// Default number of availability zones spanned by the network.
pub const DEFAULT_MAX_AZS: u8 = 2;

/// Default number of task replicas kept alive by the service.
pub const DEFAULT_DESIRED_COUNT: u32 = 1;

/// Retention window of the log sink, in days.
pub const DEFAULT_LOG_RETENTION_DAYS: u32 = 30;

/// Stream prefix used for log delivery.
pub const DEFAULT_LOG_STREAM_PREFIX: &str = "cipherstash-proxy";

/// Source CIDR admitting any IPv4 address.
pub const ANY_IPV4_CIDR: &str = "0.0.0.0/0";

/// Prefix shared by every proxy environment variable.
pub const ENV_PREFIX: &str = "CS_";

/// Separator between a section and a field in flattened nested keys.
pub const ENV_NESTED_SEPARATOR: &str = "__";

/// Application name used in CLI output.
pub const APP_NAME: &str = "proxystack";
