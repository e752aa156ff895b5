//! Configuration types for rust-fakedns
//!
//! All components receive an immutable [`ResolverConfig`] at construction;
//! nothing in the engine reads process-global configuration.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::resolver::reverse_name;

/// Default lifetime of a fake-IP mapping: 7 days
pub const DEFAULT_MAPPING_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Default identity hostname returned for local reverse lookups
pub const DEFAULT_SERVER_NAME: &str = "fakedns-server.local.";

/// Default store key namespace
pub const DEFAULT_KEY_PREFIX: &str = "fakedns";

/// Root configuration for the resolution engine
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Fake-IP pool; the network address is the pool minimum and the
    /// prefix length determines the range size
    pub fake_ip_pool: Ipv4Net,

    /// Ordered upstream nameservers, tried sequentially
    pub nameservers: Vec<SocketAddr>,

    /// Reverse-lookup names that identify this server
    pub local_reverse_names: Vec<String>,

    /// Addresses this server is bound to; converted to reverse names and
    /// merged into the local reverse-record set
    pub local_addresses: Vec<IpAddr>,

    /// Identity hostname answered for local reverse lookups
    pub server_name: String,

    /// TTL of both mapping entries and of freshly allocated A answers
    pub mapping_ttl_secs: u64,

    /// Namespace prepended to every store key
    pub key_prefix: String,

    /// Per-exchange timeout of the UDP upstream client
    pub upstream_timeout_secs: u64,

    /// Logging configuration (used by the binary)
    pub log: LogConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            // RFC 2544 benchmarking range, never routed on the public internet
            fake_ip_pool: "198.18.0.0/15".parse().expect("valid IPv4 CIDR"),
            nameservers: vec![
                SocketAddr::from(([8, 8, 8, 8], 53)),
                SocketAddr::from(([1, 1, 1, 1], 53)),
            ],
            local_reverse_names: Vec::new(),
            local_addresses: Vec::new(),
            server_name: DEFAULT_SERVER_NAME.into(),
            mapping_ttl_secs: DEFAULT_MAPPING_TTL_SECS,
            key_prefix: DEFAULT_KEY_PREFIX.into(),
            upstream_timeout_secs: 5,
            log: LogConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fake-IP pool
    #[must_use]
    pub fn with_fake_ip_pool(mut self, pool: Ipv4Net) -> Self {
        self.fake_ip_pool = pool;
        self
    }

    /// Replace the upstream nameserver list
    #[must_use]
    pub fn with_nameservers(mut self, nameservers: Vec<SocketAddr>) -> Self {
        self.nameservers = nameservers;
        self
    }

    /// Add a local reverse-record name
    #[must_use]
    pub fn with_local_reverse_name(mut self, name: impl Into<String>) -> Self {
        self.local_reverse_names.push(name.into());
        self
    }

    /// Add a local bound address
    #[must_use]
    pub fn with_local_address(mut self, addr: IpAddr) -> Self {
        self.local_addresses.push(addr);
        self
    }

    /// Set the identity hostname
    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Set the mapping TTL
    #[must_use]
    pub fn with_mapping_ttl(mut self, ttl: Duration) -> Self {
        self.mapping_ttl_secs = ttl.as_secs();
        self
    }

    /// Set the store key namespace
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the upstream exchange timeout
    #[must_use]
    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout_secs = timeout.as_secs();
        self
    }

    /// Mapping TTL as a duration
    #[must_use]
    pub fn mapping_ttl(&self) -> Duration {
        Duration::from_secs(self.mapping_ttl_secs)
    }

    /// Upstream timeout as a duration
    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Full set of local reverse-record names
    ///
    /// Explicit names are used verbatim; bound addresses are converted to
    /// their `in-addr.arpa.` / `ip6.arpa.` form.
    #[must_use]
    pub fn local_reverse_set(&self) -> HashSet<String> {
        self.local_reverse_names
            .iter()
            .cloned()
            .chain(self.local_addresses.iter().map(|addr| reverse_name(*addr)))
            .collect()
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nameservers.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one upstream nameserver must be configured".into(),
            ));
        }

        if self.fake_ip_pool.prefix_len() > 31 {
            return Err(ConfigError::ValidationError(format!(
                "fake_ip_pool {} must contain at least 2 addresses",
                self.fake_ip_pool
            )));
        }

        if self.mapping_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "mapping_ttl_secs must be greater than 0".into(),
            ));
        }

        if self.upstream_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "upstream_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.server_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server_name must not be empty".into(),
            ));
        }

        if self.key_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "key_prefix must not be empty".into(),
            ));
        }

        self.log.validate()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Include target (module path)
    #[serde(default = "default_true")]
    pub target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            target: true,
        }
    }
}

impl LogConfig {
    /// Validate the logging configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for an unknown level or format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown log level: {other}"
                )))
            }
        }

        match self.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown log format: {other}"
            ))),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_true() -> bool {
    true
}
