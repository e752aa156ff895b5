//! Blocklist suffix matching
//!
//! The blocklist is an externally maintained set of plain domain strings
//! (no wildcards). A queried name matches if the name itself, or any suffix of
//! at least two labels, is a member. The bare top-level label is never tested.
//!
//! ```text
//! a.b.example.com.  →  "a.b.example.com", "b.example.com", "example.com"
//! ```

use tracing::{debug, warn};

use crate::fakeip::CacheGateway;

/// Candidate strings to test for `domain`, in lookup order
///
/// `domain` is a fully qualified name with a trailing dot. The root name
/// yields no candidates; a single-label name yields only itself.
#[must_use]
pub fn match_candidates(domain: &str) -> Vec<&str> {
    if domain == "." {
        return Vec::new();
    }

    let name = domain.strip_suffix('.').unwrap_or(domain);
    let mut candidates = vec![name];

    // Byte offsets just past every dot; suffix i starts after the i-th dot.
    let starts: Vec<usize> = name
        .match_indices('.')
        .map(|(i, _)| i + 1)
        .collect();

    // n labels have n-1 dots; skip the last start, which would be the TLD alone
    if let Some((_, rest)) = starts.split_last() {
        candidates.extend(rest.iter().map(|&start| &name[start..]));
    }

    candidates
}

/// Membership test of queried names against the blocklist set
#[derive(Debug, Clone)]
pub struct BlocklistMatcher {
    gateway: CacheGateway,
}

impl BlocklistMatcher {
    /// Create a matcher reading the blocklist through `gateway`
    #[must_use]
    pub fn new(gateway: CacheGateway) -> Self {
        Self { gateway }
    }

    /// Check whether `domain` or one of its parent domains is blocklisted
    ///
    /// Store failures for a single candidate are logged and counted as
    /// "not a member"; the search moves on to the next suffix.
    pub async fn is_blocked(&self, domain: &str) -> bool {
        for candidate in match_candidates(domain) {
            match self.gateway.is_listed(candidate).await {
                Ok(true) => {
                    debug!(domain = %domain, matched = %candidate, "blocklist match");
                    return true;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        domain = %domain,
                        candidate = %candidate,
                        error = %e,
                        "blocklist membership check failed"
                    );
                }
            }
        }

        false
    }
}
