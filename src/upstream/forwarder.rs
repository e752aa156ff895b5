//! Sequential upstream failover
//!
//! Nameservers are tried strictly in configured order, one at a time. A
//! nameserver is skipped when the exchange fails or when it answers SERVFAIL;
//! the first answer with any other response code (NXDOMAIN included) is
//! returned unmodified and no further nameserver is contacted.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hickory_proto::op::{Message, ResponseCode};
use tracing::{debug, error};

use super::UpstreamExchange;
use crate::error::{ResolveError, ResolveResult};

/// Forwards queries to the configured nameservers with failover
#[derive(Debug, Clone)]
pub struct UpstreamForwarder {
    exchange: Arc<dyn UpstreamExchange>,
    nameservers: Vec<SocketAddr>,
}

impl UpstreamForwarder {
    /// Create a forwarder over an ordered nameserver list
    pub fn new(exchange: Arc<dyn UpstreamExchange>, nameservers: Vec<SocketAddr>) -> Self {
        Self {
            exchange,
            nameservers,
        }
    }

    /// Configured nameservers, in try order
    #[must_use]
    pub fn nameservers(&self) -> &[SocketAddr] {
        &self.nameservers
    }

    /// Forward `query` upstream
    ///
    /// # Errors
    ///
    /// - `ResolveError::NoUpstream` if no nameserver is configured.
    /// - The last exchange error if every nameserver failed and at least one
    ///   failure was a transport error.
    ///
    /// If every nameserver answered SERVFAIL, the last SERVFAIL response is
    /// returned as `Ok`.
    pub async fn forward(&self, query: &Message) -> ResolveResult<Message> {
        let (qname, qtype) = query
            .queries()
            .first()
            .map(|q| (q.name().to_string(), q.query_type().to_string()))
            .unwrap_or_default();

        let mut last_error = None;
        let mut last_servfail = None;

        for &nameserver in &self.nameservers {
            debug!(qname = %qname, nameserver = %nameserver, "resolve upstream");

            let started = Instant::now();
            match self.exchange.exchange(query, nameserver).await {
                Err(e) => {
                    error!(
                        qname = %qname,
                        qtype = %qtype,
                        nameserver = %nameserver,
                        error = %e,
                        "upstream exchange failed"
                    );
                    last_error = Some(e);
                }
                Ok(response) if response.response_code() == ResponseCode::ServFail => {
                    error!(
                        qname = %qname,
                        qtype = %qtype,
                        nameserver = %nameserver,
                        "upstream answered SERVFAIL"
                    );
                    last_servfail = Some(response);
                }
                Ok(response) => {
                    debug!(
                        qname = %qname,
                        qtype = %qtype,
                        nameserver = %nameserver,
                        rcode = %response.response_code(),
                        rtt_ms = millis(started.elapsed()),
                        "upstream resolved"
                    );
                    return Ok(response);
                }
            }
        }

        match (last_error, last_servfail) {
            (Some(e), _) => Err(e),
            (None, Some(response)) => Ok(response),
            (None, None) => Err(ResolveError::NoUpstream),
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
