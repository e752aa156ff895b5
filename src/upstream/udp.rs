//! UDP upstream exchange
//!
//! Each exchange binds a fresh ephemeral socket, sends the query once and
//! waits for a response bounded by the configured timeout. Retrying is the
//! forwarder's job, so there is no per-server retry loop here. Datagrams
//! from any address other than the nameserver are dropped and the wait
//! continues until the timeout.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_proto::op::Message;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

use super::UpstreamExchange;
use crate::error::{ResolveError, ResolveResult};

/// Default exchange timeout in seconds
pub const DEFAULT_EXCHANGE_TIMEOUT_SECS: u64 = 5;

/// Maximum UDP response buffer size (large enough for EDNS0 responses)
const UDP_RECV_BUFFER_SIZE: usize = 4096;

/// Check that `response` answers `query`
///
/// The id and the first question (name, type, class) must match.
pub fn validate_response(query: &Message, response: &Message) -> bool {
    if query.id() != response.id() {
        return false;
    }

    match (query.queries().first(), response.queries().first()) {
        (Some(q), Some(r)) => {
            q.name() == r.name()
                && q.query_type() == r.query_type()
                && q.query_class() == r.query_class()
        }
        (None, None) => true,
        _ => false,
    }
}

/// Plain UDP exchange client
#[derive(Debug, Clone)]
pub struct UdpExchange {
    timeout: Duration,
}

impl Default for UdpExchange {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_EXCHANGE_TIMEOUT_SECS))
    }
}

impl UdpExchange {
    /// Create a client with the given per-exchange timeout
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: timeout.max(Duration::from_millis(1)),
        }
    }

    /// Configured per-exchange timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn bind_addr(nameserver: SocketAddr) -> SocketAddr {
        match nameserver {
            SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
            SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
        }
    }
}

#[async_trait]
impl UpstreamExchange for UdpExchange {
    async fn exchange(&self, query: &Message, nameserver: SocketAddr) -> ResolveResult<Message> {
        let query_bytes = query.to_vec().map_err(|e| {
            ResolveError::upstream(nameserver, format!("failed to serialize DNS query: {e}"))
        })?;

        let socket = UdpSocket::bind(Self::bind_addr(nameserver))
            .await
            .map_err(|e| ResolveError::upstream(nameserver, format!("failed to bind UDP socket: {e}")))?;

        socket.send_to(&query_bytes, nameserver).await.map_err(|e| {
            ResolveError::upstream(nameserver, format!("failed to send UDP query: {e}"))
        })?;

        let mut recv_buf = vec![0u8; UDP_RECV_BUFFER_SIZE];
        let received = timeout(self.timeout, async {
            loop {
                let (len, src) = socket.recv_from(&mut recv_buf).await?;
                if src == nameserver {
                    return Ok::<_, io::Error>(len);
                }
                debug!(
                    nameserver = %nameserver,
                    source = %src,
                    "dropping datagram from unexpected source"
                );
            }
        })
        .await;

        let len = match received {
            Ok(Ok(len)) => len,
            Ok(Err(e)) => {
                return Err(ResolveError::upstream(
                    nameserver,
                    format!("failed to receive UDP response: {e}"),
                ))
            }
            Err(_) => return Err(ResolveError::timeout(nameserver, self.timeout)),
        };

        let response = Message::from_vec(&recv_buf[..len]).map_err(|e| {
            ResolveError::upstream(nameserver, format!("failed to parse DNS response: {e}"))
        })?;

        if !validate_response(query, &response) {
            return Err(ResolveError::upstream(
                nameserver,
                "response validation failed (ID or question mismatch)",
            ));
        }

        Ok(response)
    }
}
