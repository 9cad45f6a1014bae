//! Cache key composition.

use std::fmt;

use fetch_core::RequestDescriptor;
use serde::{Deserialize, Serialize};

/// A cache key uniquely identifying a cached response within one cache.
///
/// Keys are the canonical URL of the request, so cache-equivalent
/// descriptors share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for a request.
    pub fn for_request(request: &RequestDescriptor) -> Self {
        Self(request.canonical_url())
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fixed-length, filesystem-safe digest of the key.
    pub fn digest(&self) -> String {
        format!("{:016x}", url_hash(&self.0))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// FNV-1a: stable across builds, which on-disk names require.
fn url_hash(url: &str) -> u64 {
    url.bytes().fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
        (acc ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}
