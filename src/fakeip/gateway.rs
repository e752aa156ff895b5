//! Cache gateway
//!
//! Names every store key the engine touches and wraps the raw primitives in
//! operations that speak the engine's vocabulary (forward mapping, reverse
//! mapping, allocation counter, blocklist set).
//!
//! Key layout (`prefix` is configurable):
//!
//! | Key | Value |
//! |---|---|
//! | `{prefix}:domain:{qname}` | fake IPv4 address, dotted-decimal |
//! | `{prefix}:ip:{address}` | qname that owns the address |
//! | `{prefix}:current-ip` | allocation counter |
//! | `{prefix}:proxy-domains` | blocklist set |

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::store::CacheStore;

/// Engine-level view of the external cache store
#[derive(Debug, Clone)]
pub struct CacheGateway {
    store: Arc<dyn CacheStore>,
    prefix: String,
    mapping_ttl: Duration,
}

impl CacheGateway {
    /// Create a gateway over `store`
    pub fn new(store: Arc<dyn CacheStore>, prefix: impl Into<String>, mapping_ttl: Duration) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            mapping_ttl,
        }
    }

    /// Key of the Domain→IP mapping
    #[must_use]
    pub fn domain_key(&self, qname: &str) -> String {
        format!("{}:domain:{}", self.prefix, qname)
    }

    /// Key of the IP→Domain mapping
    #[must_use]
    pub fn ip_key(&self, ip: Ipv4Addr) -> String {
        format!("{}:ip:{}", self.prefix, ip)
    }

    /// Key of the allocation counter
    #[must_use]
    pub fn counter_key(&self) -> String {
        format!("{}:current-ip", self.prefix)
    }

    /// Key of the blocklist set
    #[must_use]
    pub fn blocklist_key(&self) -> String {
        format!("{}:proxy-domains", self.prefix)
    }

    /// Lifetime given to both mapping entries
    #[must_use]
    pub fn mapping_ttl(&self) -> Duration {
        self.mapping_ttl
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Remaining TTL of the Domain→IP mapping for `qname`
    pub async fn forward_ttl(&self, qname: &str) -> StoreResult<Option<Duration>> {
        self.store.ttl(&self.domain_key(qname)).await
    }

    /// Fake address currently mapped to `qname`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidValue` if the stored value is not an IPv4 address.
    pub async fn forward_address(&self, qname: &str) -> StoreResult<Option<Ipv4Addr>> {
        let key = self.domain_key(qname);
        match self.store.get(&key).await? {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| StoreError::invalid_value(key, format!("not an IPv4 address: {value}"))),
            None => Ok(None),
        }
    }

    /// Domain that owns the fake address `ip`, if any
    pub async fn domain_for_ip(&self, ip: Ipv4Addr) -> StoreResult<Option<String>> {
        self.store.get(&self.ip_key(ip)).await
    }

    /// Atomically advance the allocation counter
    pub async fn next_counter(&self) -> StoreResult<i64> {
        self.store.incr(&self.counter_key()).await
    }

    /// Create the IP→Domain mapping if the address is free
    ///
    /// Returns `false` if the address is already mapped.
    pub async fn claim_address(&self, ip: Ipv4Addr, qname: &str) -> StoreResult<bool> {
        self.store
            .set_nx(&self.ip_key(ip), qname, self.mapping_ttl)
            .await
    }

    /// Create the Domain→IP mapping if the domain has none
    ///
    /// Returns `false` if the domain is already mapped.
    pub async fn claim_domain(&self, qname: &str, ip: Ipv4Addr) -> StoreResult<bool> {
        self.store
            .set_nx(&self.domain_key(qname), &ip.to_string(), self.mapping_ttl)
            .await
    }

    /// Fire-and-forget removal of the IP→Domain mapping
    ///
    /// Used to roll back a half-written mapping pair. A failure here is logged
    /// and swallowed; the caller's own error is what gets reported.
    pub async fn release_address(&self, ip: Ipv4Addr) {
        let key = self.ip_key(ip);
        if let Err(e) = self.store.del(&key).await {
            warn!(key = %key, error = %e, "rollback of fake-ip mapping failed");
        }
    }

    /// Exact membership test against the blocklist set
    pub async fn is_listed(&self, domain: &str) -> StoreResult<bool> {
        self.store.sismember(&self.blocklist_key(), domain).await
    }
}
