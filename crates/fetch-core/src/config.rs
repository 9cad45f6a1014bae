//! Orchestration configuration.

use serde::{Deserialize, Serialize};

use crate::request::{CacheName, RequestDescriptor};

/// What a single orchestration run needs: which request, which cache and
/// which strategy.
///
/// The strategy is kept as the raw identifier the caller supplied; an
/// unrecognized or missing value is coerced to network-only at resolution
/// time instead of failing here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Strategy identifier (e.g. `cache-then-network`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Durable cache to read from and write to.
    #[serde(default)]
    pub cache_name: CacheName,
    /// Request to resolve.
    pub request: RequestDescriptor,
}

impl FetchConfig {
    /// Create a config for a request with default cache and strategy.
    pub fn new(request: impl Into<RequestDescriptor>) -> Self {
        Self {
            strategy: None,
            cache_name: CacheName::default(),
            request: request.into(),
        }
    }

    /// Set the strategy identifier.
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    /// Set the cache name.
    pub fn with_cache_name(mut self, cache_name: impl Into<CacheName>) -> Self {
        self.cache_name = cache_name.into();
        self
    }

    /// Strategy identifier, if one was given.
    pub fn strategy_id(&self) -> Option<&str> {
        self.strategy.as_deref()
    }
}
