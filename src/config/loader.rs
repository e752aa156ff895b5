//! Configuration loading
//!
//! Configuration comes from a JSON file, optionally overridden by
//! environment variables.

use std::net::SocketAddr;
use std::path::Path;

use tracing::{debug, info};

use super::types::ResolverConfig;
use crate::error::ConfigError;

/// Load configuration from a JSON file
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed or validated.
pub fn load_config(path: impl AsRef<Path>) -> Result<ResolverConfig, ConfigError> {
    let path = path.as_ref();

    debug!("Loading configuration from {:?}", path);

    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let contents = std::fs::read_to_string(path)?;

    let config: ResolverConfig = serde_json::from_str(&contents).map_err(|e| {
        ConfigError::ParseError(format!("Failed to parse JSON: {e} at {path:?}"))
    })?;

    config.validate()?;

    info!(
        "Configuration loaded: pool={}, {} nameservers, {} local reverse names",
        config.fake_ip_pool,
        config.nameservers.len(),
        config.local_reverse_set().len()
    );

    Ok(config)
}

/// Load configuration from a JSON string
///
/// # Errors
///
/// Returns `ConfigError` if parsing or validation fails.
pub fn load_config_str(json: &str) -> Result<ResolverConfig, ConfigError> {
    let config: ResolverConfig =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.validate()?;

    Ok(config)
}

/// Load configuration with environment variable overrides
///
/// Environment variables:
/// - `RUST_FAKEDNS_NAMESERVERS`: comma-separated upstream socket addresses
/// - `RUST_FAKEDNS_FAKE_IP_POOL`: fake-IP pool in CIDR notation
/// - `RUST_FAKEDNS_LOG_LEVEL`: log level
///
/// # Errors
///
/// Returns `ConfigError` if loading, parsing or an override fails.
pub fn load_config_with_env(path: impl AsRef<Path>) -> Result<ResolverConfig, ConfigError> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    // Re-validate after overrides
    config.validate()?;

    Ok(config)
}

/// Built-in defaults with environment variable overrides
///
/// Used when no configuration file is present. Honours the same variables
/// as [`load_config_with_env`].
///
/// # Errors
///
/// Returns `ConfigError` if an override is malformed or the result is invalid.
pub fn default_config_with_env() -> Result<ResolverConfig, ConfigError> {
    defaults_with_overrides(|name| std::env::var(name).ok())
}

fn defaults_with_overrides(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ResolverConfig, ConfigError> {
    let mut config = ResolverConfig::default();
    apply_env_overrides(&mut config, lookup)?;
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides(
    config: &mut ResolverConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(list) = lookup("RUST_FAKEDNS_NAMESERVERS") {
        config.nameservers = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<SocketAddr>().map_err(|_| ConfigError::EnvError {
                    name: "RUST_FAKEDNS_NAMESERVERS".into(),
                    reason: format!("Invalid socket address: {s}"),
                })
            })
            .collect::<Result<_, _>>()?;
        debug!("Nameservers overridden to {:?}", config.nameservers);
    }

    if let Some(pool) = lookup("RUST_FAKEDNS_FAKE_IP_POOL") {
        config.fake_ip_pool = pool.parse().map_err(|_| ConfigError::EnvError {
            name: "RUST_FAKEDNS_FAKE_IP_POOL".into(),
            reason: format!("Invalid IPv4 CIDR: {pool}"),
        })?;
        debug!("Fake-IP pool overridden to {}", config.fake_ip_pool);
    }

    if let Some(level) = lookup("RUST_FAKEDNS_LOG_LEVEL") {
        config.log.level = level;
        debug!("Log level overridden to {}", config.log.level);
    }

    Ok(())
}

/// Write a default configuration file to the given path
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be written.
pub fn create_default_config(path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let config = ResolverConfig::default();
    let json = serde_json::to_string_pretty(&config)
        .map_err(|e| ConfigError::ParseError(format!("Failed to serialize config: {e}")))?;

    std::fs::write(path, json)?;
    Ok(())
}
