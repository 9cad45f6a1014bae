//! Strategy identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordering/fallback policy between the cache and the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Serve from cache; on a miss fetch, store and serve from the network.
    CacheFallbackNetwork,
    /// Race cache and network; fresh network data supersedes the cache.
    CacheThenNetwork,
    /// Network only, no caching.
    Network,
    /// Fetch, store and serve from the network; on failure serve from cache.
    NetworkFallbackCache,
}

impl Strategy {
    /// All strategies.
    pub const ALL: [Strategy; 4] = [
        Strategy::CacheFallbackNetwork,
        Strategy::CacheThenNetwork,
        Strategy::Network,
        Strategy::NetworkFallbackCache,
    ];

    /// Canonical identifier.
    pub fn id(&self) -> &'static str {
        match self {
            Self::CacheFallbackNetwork => "cache-fallback-network",
            Self::CacheThenNetwork => "cache-then-network",
            Self::Network => "network",
            Self::NetworkFallbackCache => "network-fallback-cache",
        }
    }

    /// One-line description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::CacheFallbackNetwork => "cache first, network on miss",
            Self::CacheThenNetwork => "cache and network raced, network supersedes",
            Self::Network => "network only, no caching",
            Self::NetworkFallbackCache => "network first, cache on failure",
        }
    }

    /// Check if this strategy ever touches the cache.
    pub fn uses_cache(&self) -> bool {
        !matches!(self, Self::Network)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Identifier that names none of the strategies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strategy: {0:?}")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    /// Accepts kebab, snake and camel case, case-insensitively
    /// (`cache-then-network`, `cache_then_network`, `cacheThenNetwork`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "cachefallbacknetwork" => Ok(Self::CacheFallbackNetwork),
            "cachethennetwork" => Ok(Self::CacheThenNetwork),
            "network" | "networkonly" => Ok(Self::Network),
            "networkfallbackcache" => Ok(Self::NetworkFallbackCache),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}
