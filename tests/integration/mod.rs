//! Integration tests for rust-fakedns
//!
//! Every test drives queries through [`rust_fakedns::QueryRouter`], the same
//! entry point a listener would use.
//!
//! # Test Organization
//!
//! - `common`: shared router/store builders and mock nameservers
//! - `allocation`: fake-IP allocation, cache reuse and the pairing invariant
//! - `failover`: upstream failover over real UDP sockets on loopback
//! - `reverse`: PTR self-identification and pass-through
//!
//! # Test Requirements
//!
//! - No external network access; mock nameservers bind to 127.0.0.1

pub mod allocation;
pub mod failover;
pub mod reverse;
