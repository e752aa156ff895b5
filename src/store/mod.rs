//! Key-value cache store abstraction
//!
//! The resolution engine consumes its backing store only through the six
//! primitives of [`CacheStore`]. Any store offering create-if-absent with
//! expiry, remaining-TTL lookup, atomic increment, delete and set membership
//! (Redis being the usual choice) can back the engine.
//!
//! [`MemoryStore`] is a process-local implementation used for embedding and
//! testing.

mod memory;

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreResult;

pub use memory::MemoryStore;

/// The six cache primitives the engine depends on
///
/// Implementations must be safe for concurrent use by many queries at once.
/// Every primitive may fail with a [`StoreError`](crate::error::StoreError),
/// which is surfaced to the caller unchanged.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Get the value of `key`, or `None` if it does not exist
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Create `key` with `value` and expiry `ttl` only if it does not exist
    ///
    /// Returns `true` if the key was written, `false` if it already existed.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<bool>;

    /// Remaining time-to-live of `key`
    ///
    /// Returns `None` if the key does not exist or has no expiry.
    async fn ttl(&self, key: &str) -> StoreResult<Option<Duration>>;

    /// Atomically increment the integer at `key` and return the new value
    ///
    /// A missing key counts as zero.
    async fn incr(&self, key: &str) -> StoreResult<i64>;

    /// Delete `key`, returning whether it existed
    async fn del(&self, key: &str) -> StoreResult<bool>;

    /// Test whether `member` belongs to the set stored at `set`
    async fn sismember(&self, set: &str, member: &str) -> StoreResult<bool>;
}
