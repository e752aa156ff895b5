//! Internal A-record resolution with fake-IP allocation
//!
//! Per query:
//!
//! 1. **Cache check**: if the Domain→IP mapping has more than one second of
//!    TTL left, answer with the cached address and that TTL.
//! 2. **Blocklist check**: names that are not blocklisted are forwarded
//!    upstream and the upstream answer is returned verbatim.
//! 3. **Allocate**: under the allocation lock, advance the counter, derive
//!    the candidate address, create the IP→Domain mapping and then the
//!    Domain→IP mapping. Either create-if-absent finding an existing key
//!    fails the query; a failure of the second write removes the first.
//!
//! A remaining TTL in `(0, 1]` seconds is treated as a miss.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use hickory_proto::op::Message;
use tokio::sync::Mutex;
use tracing::debug;

use super::response::{a_record, reply_to};
use crate::blocklist::BlocklistMatcher;
use crate::error::{ResolveError, ResolveResult};
use crate::fakeip::{CacheGateway, FakeIpPool};
use crate::upstream::UpstreamForwarder;

/// Cached mappings with at most this much TTL left count as misses
const MIN_CACHED_TTL: Duration = Duration::from_secs(1);

/// Resolver for A/IN queries
#[derive(Debug)]
pub struct InternalResolver {
    gateway: CacheGateway,
    pool: FakeIpPool,
    blocklist: BlocklistMatcher,
    forwarder: UpstreamForwarder,
    /// Serializes the counter-increment / paired-write sequence
    allocation_lock: Arc<Mutex<()>>,
}

impl InternalResolver {
    /// Create a resolver with its own allocation lock
    pub fn new(gateway: CacheGateway, pool: FakeIpPool, forwarder: UpstreamForwarder) -> Self {
        Self {
            blocklist: BlocklistMatcher::new(gateway.clone()),
            gateway,
            pool,
            forwarder,
            allocation_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Share an allocation lock with other resolvers of the same store
    #[must_use]
    pub fn with_allocation_lock(mut self, lock: Arc<Mutex<()>>) -> Self {
        self.allocation_lock = lock;
        self
    }

    /// The allocation lock guarding this resolver's critical section
    #[must_use]
    pub fn allocation_lock(&self) -> &Arc<Mutex<()>> {
        &self.allocation_lock
    }

    /// The fake-IP pool
    #[must_use]
    pub fn pool(&self) -> &FakeIpPool {
        &self.pool
    }

    /// Check if an address belongs to the fake-IP pool
    #[must_use]
    pub fn is_fake_ip(&self, ip: Ipv4Addr) -> bool {
        self.pool.contains(ip)
    }

    /// Domain currently owning the fake address `ip`
    ///
    /// This is the lookup a proxy performs when traffic arrives for a fake IP.
    pub async fn lookup_domain(&self, ip: Ipv4Addr) -> ResolveResult<Option<String>> {
        Ok(self.gateway.domain_for_ip(ip).await?)
    }

    /// Resolve an A/IN query
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Store` on any cache primitive failure,
    /// `ResolveError::DuplicateKey` when allocation collides, and upstream
    /// errors for non-blocklisted names that no nameserver could answer.
    pub async fn resolve(&self, request: &Message) -> ResolveResult<Message> {
        let query = request
            .queries()
            .first()
            .ok_or_else(|| ResolveError::invalid_query("empty question section"))?;
        let name = query.name();
        let qname = name.to_string();

        if let Some(ttl) = self.gateway.forward_ttl(&qname).await? {
            if ttl > MIN_CACHED_TTL {
                if let Some(ip) = self.gateway.forward_address(&qname).await? {
                    let ttl_secs = u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX);
                    let mut response = reply_to(request);
                    response.add_answer(a_record(name, ip, ttl_secs));
                    debug!(qname = %qname, ip = %ip, ttl = ttl_secs, "internal resolve (cached)");
                    return Ok(response);
                }
            }
        }

        if !self.blocklist.is_blocked(&qname).await {
            return self.forwarder.forward(request).await;
        }

        let ip = self.allocate(&qname).await?;
        let ttl_secs = u32::try_from(self.gateway.mapping_ttl().as_secs()).unwrap_or(u32::MAX);

        let mut response = reply_to(request);
        response.add_answer(a_record(name, ip, ttl_secs));
        debug!(qname = %qname, ip = %ip, ttl = ttl_secs, "internal resolve (new)");
        Ok(response)
    }

    /// Allocate a fake address for `qname` and write the mapping pair
    async fn allocate(&self, qname: &str) -> ResolveResult<Ipv4Addr> {
        let _guard = self.allocation_lock.lock().await;

        let counter = self.gateway.next_counter().await?;
        let ip = self.pool.candidate(counter);

        if !self.gateway.claim_address(ip, qname).await? {
            return Err(ResolveError::duplicate_key(self.gateway.ip_key(ip), qname));
        }

        match self.gateway.claim_domain(qname, ip).await {
            Ok(true) => Ok(ip),
            Ok(false) => {
                self.gateway.release_address(ip).await;
                Err(ResolveError::duplicate_key(
                    self.gateway.domain_key(qname),
                    ip.to_string(),
                ))
            }
            Err(e) => {
                self.gateway.release_address(ip).await;
                Err(e.into())
            }
        }
    }
}
