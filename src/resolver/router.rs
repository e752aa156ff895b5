//! Top-level query dispatch
//!
//! The router classifies each query by its first question and hands it to
//! the PTR resolver, the internal resolver or the upstream forwarder. It is
//! also the single error boundary: resolution errors and panics below this
//! point become SERVFAIL responses, so one bad query never takes down the
//! listener that feeds the router.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use hickory_proto::op::{Message, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use tracing::{debug, error};

use super::internal::InternalResolver;
use super::ptr::PtrResolver;
use super::response::servfail;
use crate::config::ResolverConfig;
use crate::error::{ConfigError, ResolveError, ResolveResult};
use crate::fakeip::{CacheGateway, FakeIpPool};
use crate::store::CacheStore;
use crate::upstream::{UpstreamExchange, UpstreamForwarder};

/// Where a query is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Reverse lookup, any class
    Ptr,
    /// IPv4 address lookup in class IN
    Internal,
    /// Everything else
    Upstream,
}

impl Route {
    /// Classify a question
    #[must_use]
    pub fn classify(query: &Query) -> Self {
        if query.query_type() == RecordType::PTR {
            Self::Ptr
        } else if query.query_type() == RecordType::A && query.query_class() == DNSClass::IN {
            Self::Internal
        } else {
            Self::Upstream
        }
    }
}

/// Router statistics
#[derive(Debug, Default)]
pub struct RouterStats {
    queries: AtomicU64,
    internal: AtomicU64,
    ptr: AtomicU64,
    upstream: AtomicU64,
    failures: AtomicU64,
    panics: AtomicU64,
    dropped: AtomicU64,
}

impl RouterStats {
    /// Create zeroed statistics
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record_route(&self, route: Route) {
        let counter = match route {
            Route::Ptr => &self.ptr,
            Route::Internal => &self.internal,
            Route::Upstream => &self.upstream,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of the current counters
    #[must_use]
    pub fn snapshot(&self) -> RouterStatsSnapshot {
        RouterStatsSnapshot {
            queries: self.queries.load(Ordering::Relaxed),
            internal: self.internal.load(Ordering::Relaxed),
            ptr: self.ptr.load(Ordering::Relaxed),
            upstream: self.upstream.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of router statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStatsSnapshot {
    /// Queries received
    pub queries: u64,
    /// Queries routed to the internal resolver
    pub internal: u64,
    /// Queries routed to the PTR resolver
    pub ptr: u64,
    /// Queries routed straight upstream
    pub upstream: u64,
    /// Queries answered with SERVFAIL because resolution failed
    pub failures: u64,
    /// Queries answered with SERVFAIL because resolution panicked
    pub panics: u64,
    /// Queries without a question, left unanswered
    pub dropped: u64,
}

/// Top-level DNS query dispatcher
#[derive(Debug)]
pub struct QueryRouter {
    internal: InternalResolver,
    ptr: PtrResolver,
    forwarder: UpstreamForwarder,
    stats: RouterStats,
}

impl QueryRouter {
    /// Assemble a router from its resolvers
    pub fn new(internal: InternalResolver, ptr: PtrResolver, forwarder: UpstreamForwarder) -> Self {
        Self {
            internal,
            ptr,
            forwarder,
            stats: RouterStats::new(),
        }
    }

    /// Build the full resolver stack from configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid or the server
    /// name is not a valid domain name.
    pub fn from_config(
        config: &ResolverConfig,
        store: Arc<dyn CacheStore>,
        exchange: Arc<dyn UpstreamExchange>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut server_name = Name::from_ascii(&config.server_name).map_err(|e| {
            ConfigError::ValidationError(format!(
                "invalid server_name '{}': {e}",
                config.server_name
            ))
        })?;
        server_name.set_fqdn(true);

        let forwarder = UpstreamForwarder::new(exchange, config.nameservers.clone());
        let gateway = CacheGateway::new(store, config.key_prefix.clone(), config.mapping_ttl());
        let pool = FakeIpPool::from_network(config.fake_ip_pool);

        let internal = InternalResolver::new(gateway, pool, forwarder.clone());
        let ptr = PtrResolver::new(config.local_reverse_set(), server_name, forwarder.clone());

        Ok(Self::new(internal, ptr, forwarder))
    }

    /// The internal resolver (fake-IP lookups for the proxy layer)
    #[must_use]
    pub fn internal(&self) -> &InternalResolver {
        &self.internal
    }

    /// The PTR resolver
    #[must_use]
    pub fn ptr(&self) -> &PtrResolver {
        &self.ptr
    }

    /// The upstream forwarder
    #[must_use]
    pub fn forwarder(&self) -> &UpstreamForwarder {
        &self.forwarder
    }

    /// Router statistics
    #[must_use]
    pub fn stats(&self) -> &RouterStats {
        &self.stats
    }

    /// Answer one query
    ///
    /// Returns `None` only for a request without any question; every other
    /// request gets exactly one response, SERVFAIL if resolution failed or
    /// panicked.
    pub async fn handle(&self, request: &Message) -> Option<Message> {
        self.stats.queries.fetch_add(1, Ordering::Relaxed);

        let Some(query) = request.queries().first() else {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(id = request.id(), "dropping request without question");
            return None;
        };

        let route = Route::classify(query);
        self.stats.record_route(route);

        match AssertUnwindSafe(self.dispatch(route, request))
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => Some(response),
            Ok(Err(e)) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    qname = %query.name(),
                    qtype = %query.query_type(),
                    error = %e,
                    "process resolve error"
                );
                Some(servfail(request))
            }
            Err(payload) => {
                self.stats.panics.fetch_add(1, Ordering::Relaxed);
                let e = panic_error(payload.as_ref());
                error!(
                    error = %e,
                    request = ?request,
                    backtrace = %Backtrace::capture(),
                    "panic while resolving query"
                );
                Some(servfail(request))
            }
        }
    }

    async fn dispatch(&self, route: Route, request: &Message) -> ResolveResult<Message> {
        match route {
            Route::Ptr => self.ptr.resolve(request).await,
            Route::Internal => self.internal.resolve(request).await,
            Route::Upstream => self.forwarder.forward(request).await,
        }
    }
}

/// Convert a caught panic payload into a resolution error
fn panic_error(payload: &(dyn Any + Send)) -> ResolveError {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    ResolveError::internal(format!("panic: {reason}"))
}
