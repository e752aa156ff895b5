//! Error types for rust-fakedns
//!
//! Errors are split by subsystem:
//!
//! - [`StoreError`]: failures of the external key-value store primitives
//! - [`ResolveError`]: failures while answering a single DNS query
//! - [`ConfigError`]: configuration loading and validation failures
//!
//! Only [`ResolveError`] ever reaches the query router, which turns it into a
//! SERVFAIL response for the current query.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by a [`CacheStore`](crate::store::CacheStore) primitive
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the command
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    /// A stored value had an unexpected shape (e.g. INCR on a non-integer)
    #[error("Invalid value for key {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl StoreError {
    /// Create an unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for store primitives
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while resolving a single query
///
/// Upstream and timeout errors are retried by the forwarder against the next
/// nameserver; every other variant aborts the current query.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A cache primitive failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A nameserver exchange failed (transport, decode or validation)
    #[error("Upstream {nameserver} failed: {reason}")]
    Upstream { nameserver: String, reason: String },

    /// A nameserver exchange did not complete in time
    #[error("Upstream {nameserver} timed out after {timeout:?}")]
    Timeout {
        nameserver: String,
        timeout: Duration,
    },

    /// Create-if-absent found an existing key during fake-IP allocation
    #[error("Duplicate key: {key} ({value})")]
    DuplicateKey { key: String, value: String },

    /// No nameserver is configured
    #[error("No upstream nameserver configured")]
    NoUpstream,

    /// The query or a value derived from it is malformed
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Unexpected internal fault, such as a panic caught by the router
    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl ResolveError {
    /// Create an upstream error
    pub fn upstream(nameserver: impl ToString, reason: impl Into<String>) -> Self {
        Self::Upstream {
            nameserver: nameserver.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(nameserver: impl ToString, timeout: Duration) -> Self {
        Self::Timeout {
            nameserver: nameserver.to_string(),
            timeout,
        }
    }

    /// Create a duplicate key error
    pub fn duplicate_key(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::DuplicateKey {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create an invalid query error
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Whether the forwarder should move on to the next nameserver
    #[must_use]
    pub fn is_upstream_failure(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::Timeout { .. })
    }
}

/// Result type for query resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found or inaccessible
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Validation error (invalid values, missing required fields)
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Environment variable error
    #[error("Environment variable error: {name}: {reason}")]
    EnvError { name: String, reason: String },

    /// I/O error while reading config
    #[error("I/O error reading configuration: {0}")]
    IoError(#[from] io::Error),
}
