//! Fake-IP pool
//!
//! The pool is the window `[min_address, min_address + range_size)`. The
//! candidate for a counter value `n` is `min_address + (n mod range_size)`, so
//! allocation wraps around after `range_size` counter values. Whether the
//! candidate is still in use is decided by the store, not by the pool.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

/// Number of addresses in the IPv4 space
const MAX_RANGE_SIZE: u64 = 1 << 32;

/// IPv4 fake-IP window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeIpPool {
    min_address: u32,
    range_size: u64,
}

impl FakeIpPool {
    /// Create a pool from its first address and number of addresses
    ///
    /// A zero `range_size` is treated as a single-address pool; sizes beyond
    /// the IPv4 space are capped to it.
    #[must_use]
    pub fn new(min_address: Ipv4Addr, range_size: u64) -> Self {
        Self {
            min_address: u32::from(min_address),
            range_size: range_size.clamp(1, MAX_RANGE_SIZE),
        }
    }

    /// Create a pool covering every address of `network`
    #[must_use]
    pub fn from_network(network: Ipv4Net) -> Self {
        let range_size = 1u64 << (32 - u32::from(network.prefix_len()));
        Self::new(network.network(), range_size)
    }

    /// Candidate address for an allocation counter value
    #[must_use]
    pub fn candidate(&self, counter: i64) -> Ipv4Addr {
        let offset = i128::from(counter).rem_euclid(i128::from(self.range_size));
        let offset = u32::try_from(offset).unwrap_or(u32::MAX);
        Ipv4Addr::from(self.min_address.wrapping_add(offset))
    }

    /// Check if an address falls inside the pool window
    #[must_use]
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let offset = u64::from(u32::from(addr).wrapping_sub(self.min_address));
        offset < self.range_size
    }

    /// First address of the pool
    #[must_use]
    pub fn min_address(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.min_address)
    }

    /// Number of addresses in the pool
    #[must_use]
    pub fn size(&self) -> u64 {
        self.range_size
    }
}
