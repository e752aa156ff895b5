//! rust-fakedns: Fake-IP DNS resolution engine
//!
//! This crate answers IPv4 address queries for blocklisted domains with
//! synthetic addresses drawn from a reserved pool, so that a downstream proxy
//! layer can recognize traffic to those domains by destination address alone.
//! Every other query is forwarded to the configured upstream nameservers.
//!
//! The bidirectional domain/address mappings, the allocation counter and the
//! blocklist itself live in an external key-value store reached through
//! [`store::CacheStore`].
//!
//! # Architecture
//!
//! ```text
//! Query → QueryRouter ─┬─ PTR ──▶ PtrResolver ──▶ identity hostname | upstream
//!                      ├─ A/IN ─▶ InternalResolver ──▶ cache | fake IP | upstream
//!                      └─ other ▶ UpstreamForwarder
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use rust_fakedns::config::load_config;
//! use rust_fakedns::store::MemoryStore;
//! use rust_fakedns::upstream::UdpExchange;
//! use rust_fakedns::QueryRouter;
//!
//! # async fn example(request: hickory_proto::op::Message) -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("/etc/rust-fakedns/config.json")?;
//!
//! let router = QueryRouter::from_config(
//!     &config,
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(UdpExchange::new(config.upstream_timeout())),
//! )?;
//!
//! if let Some(response) = router.handle(&request).await {
//!     println!("{} answers", response.answers().len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`blocklist`]: Suffix matching against the blocklist set
//! - [`config`]: Configuration types and loading
//! - [`error`]: Error types
//! - [`fakeip`]: Fake-IP pool and store gateway
//! - [`resolver`]: Query routing and resolution
//! - [`store`]: Cache store abstraction and in-memory store
//! - [`upstream`]: Upstream exchange and failover

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod blocklist;
pub mod config;
pub mod error;
pub mod fakeip;
pub mod resolver;
pub mod store;
pub mod upstream;

// Re-export commonly used types at the crate root
pub use blocklist::BlocklistMatcher;
pub use config::{LogConfig, ResolverConfig};
pub use error::{ConfigError, ResolveError, StoreError};
pub use fakeip::{CacheGateway, FakeIpPool};
pub use resolver::{InternalResolver, PtrResolver, QueryRouter, Route, RouterStatsSnapshot};
pub use store::{CacheStore, MemoryStore};
pub use upstream::{UdpExchange, UpstreamExchange, UpstreamForwarder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
