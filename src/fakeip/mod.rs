//! Fake-IP allocation building blocks
//!
//! - [`FakeIpPool`]: deterministic candidate derivation from the allocation counter
//! - [`CacheGateway`]: the engine's view of the external store (mapping keys,
//!   allocation counter and blocklist set)

mod gateway;
mod pool;

pub use gateway::CacheGateway;
pub use pool::FakeIpPool;
