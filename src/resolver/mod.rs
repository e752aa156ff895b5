//! Query resolution
//!
//! ```text
//! Query
//!   │
//!   ▼
//! ┌──────────────┐  PTR   ┌──────────────┐  local name  ──▶ identity hostname
//! │ QueryRouter  │ ─────▶ │ PtrResolver  │  otherwise   ──▶ upstream
//! └──────┬───────┘        └──────────────┘
//!        │ A / IN
//!        ▼
//! ┌──────────────────┐  cache hit ──▶ cached fake IP
//! │ InternalResolver │  blocklisted ──▶ allocate fake IP
//! └──────┬───────────┘  otherwise ──▶ upstream
//!        │ anything else
//!        ▼
//! ┌──────────────────┐
//! │ UpstreamForwarder│
//! └──────────────────┘
//! ```

mod internal;
mod ptr;
mod response;
mod router;

pub use internal::InternalResolver;
pub use ptr::{reverse_name, PtrResolver};
pub use response::{a_record, ptr_record, reply_to, servfail};
pub use router::{QueryRouter, Route, RouterStats, RouterStatsSnapshot};
