//! Configuration module for rust-fakedns
//!
//! This module provides configuration types and loading utilities.
//!
//! # Example
//!
//! ```no_run
//! use rust_fakedns::config::load_config;
//!
//! let config = load_config("/etc/rust-fakedns/config.json").unwrap();
//! println!("Fake-IP pool: {}", config.fake_ip_pool);
//! ```

mod loader;
mod types;

pub use loader::{
    create_default_config, default_config_with_env, load_config, load_config_str,
    load_config_with_env,
};
pub use types::{
    LogConfig, ResolverConfig, DEFAULT_KEY_PREFIX, DEFAULT_MAPPING_TTL_SECS, DEFAULT_SERVER_NAME,
};
