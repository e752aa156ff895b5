//! Reverse-lookup self-identification
//!
//! Reverse lookups for one of the server's own addresses are answered with
//! the identity hostname and TTL 0. Every other PTR query, including those for
//! previously allocated fake IPs, is forwarded upstream unchanged.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::net::IpAddr;

use hickory_proto::op::Message;
use hickory_proto::rr::Name;
use tracing::debug;

use super::response::{ptr_record, reply_to};
use crate::error::{ResolveError, ResolveResult};
use crate::upstream::UpstreamForwarder;

/// Reverse-lookup name of an address, with trailing dot
///
/// `127.0.0.1` becomes `1.0.0.127.in-addr.arpa.`; IPv6 addresses use the
/// reversed-nibble `ip6.arpa.` form.
#[must_use]
pub fn reverse_name(addr: IpAddr) -> String {
    match addr {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}.in-addr.arpa.")
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(72);
            for byte in v6.octets().iter().rev() {
                let _ = write!(name, "{:x}.{:x}.", byte & 0x0f, byte >> 4);
            }
            name.push_str("ip6.arpa.");
            name
        }
    }
}

/// Resolver for PTR queries
#[derive(Debug)]
pub struct PtrResolver {
    local_names: HashSet<String>,
    server_name: Name,
    forwarder: UpstreamForwarder,
}

impl PtrResolver {
    /// Create a PTR resolver
    ///
    /// `local_names` are compared verbatim against the queried name.
    pub fn new(local_names: HashSet<String>, server_name: Name, forwarder: UpstreamForwarder) -> Self {
        Self {
            local_names,
            server_name,
            forwarder,
        }
    }

    /// Identity hostname answered for local reverse lookups
    #[must_use]
    pub fn server_name(&self) -> &Name {
        &self.server_name
    }

    /// Whether `qname` is one of the server's own reverse names
    #[must_use]
    pub fn is_local(&self, qname: &str) -> bool {
        self.local_names.contains(qname)
    }

    /// Resolve a PTR query
    ///
    /// # Errors
    ///
    /// Returns upstream errors for non-local names that no nameserver could answer.
    pub async fn resolve(&self, request: &Message) -> ResolveResult<Message> {
        let query = request
            .queries()
            .first()
            .ok_or_else(|| ResolveError::invalid_query("empty question section"))?;
        let qname = query.name().to_string();

        if self.is_local(&qname) {
            let mut response = reply_to(request);
            response.add_answer(ptr_record(query.name(), &self.server_name, 0));
            debug!(qname = %qname, answer = %self.server_name, "local reverse lookup");
            return Ok(response);
        }

        self.forwarder.forward(request).await
    }
}
