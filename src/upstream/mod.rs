//! Upstream nameserver access
//!
//! - [`UpstreamExchange`]: one request/response exchange with one nameserver
//! - [`UpstreamForwarder`]: sequential failover across the configured nameservers
//! - [`UdpExchange`]: plain UDP (RFC 1035) implementation of the exchange

mod forwarder;
mod udp;

use std::fmt::Debug;
use std::net::SocketAddr;

use async_trait::async_trait;
use hickory_proto::op::Message;

use crate::error::ResolveResult;

pub use forwarder::UpstreamForwarder;
pub use udp::{validate_response, UdpExchange, DEFAULT_EXCHANGE_TIMEOUT_SECS};

/// A single query exchange with a nameserver
///
/// Implementations return the nameserver's response unmodified, whatever its
/// response code. Transport, timeout and decode failures are reported as
/// [`ResolveError::Upstream`](crate::error::ResolveError::Upstream) or
/// [`ResolveError::Timeout`](crate::error::ResolveError::Timeout).
#[async_trait]
pub trait UpstreamExchange: Send + Sync + Debug {
    /// Send `query` to `nameserver` and await its response
    async fn exchange(&self, query: &Message, nameserver: SocketAddr) -> ResolveResult<Message>;
}
