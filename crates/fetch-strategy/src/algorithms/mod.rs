//! The four orchestration algorithms.
//!
//! Each algorithm drives one `Run`: it consults the cache and the network
//! in its own order and reports through `Run::report`. Cache and network
//! failures are logged and end the run quietly, except in
//! `CacheFallbackNetwork` where the fetch after a cache miss has nowhere
//! left to fall back to and returns a `RunError`.

mod cache_fallback_network;
mod cache_then_network;
mod network_fallback_cache;
mod network_only;

use async_trait::async_trait;

use crate::error::RunError;
use crate::run::Run;
use crate::strategy::Strategy;

pub use cache_fallback_network::CacheFallbackNetwork;
pub use cache_then_network::CacheThenNetwork;
pub use network_fallback_cache::NetworkFallbackCache;
pub use network_only::NetworkOnly;

/// Coordination procedure for one strategy.
#[async_trait]
pub trait Algorithm: Send + Sync {
    /// Strategy this algorithm implements.
    fn strategy(&self) -> Strategy;

    /// Drive a started run to completion.
    async fn run(&self, run: &Run) -> Result<(), RunError>;
}

/// Algorithm for a strategy.
pub(crate) fn for_strategy(strategy: Strategy) -> &'static dyn Algorithm {
    match strategy {
        Strategy::CacheFallbackNetwork => &CacheFallbackNetwork,
        Strategy::CacheThenNetwork => &CacheThenNetwork,
        Strategy::Network => &NetworkOnly,
        Strategy::NetworkFallbackCache => &NetworkFallbackCache,
    }
}


#[cfg(test)]
mod tests {
    use super::fixture::Harness;
    use super::*;
    use fetch_core::Provenance;
    use serde_json::json;

    #[test]
    fn test_for_strategy_matches() {
        for strategy in Strategy::ALL {
            assert_eq!(for_strategy(strategy).strategy(), strategy);
        }
    }

    #[tokio::test]
    async fn test_populated_cache_unreachable_network_is_idempotent() {
        for strategy in Strategy::ALL {
            let harness = Harness::new();
            harness.seed(&json!([{"id": 1}]));

            let algorithm = for_strategy(strategy);
            let first = harness.execute(algorithm).await.is_ok();
            let after_first = harness.sink.reports();
            let second = harness.execute(algorithm).await.is_ok();
            let reports = harness.sink.reports();

            assert!(first && second, "{} failed", strategy);
            assert_eq!(reports.len(), after_first.len() * 2, "{}", strategy);
            assert_eq!(&reports[after_first.len()..], &after_first[..], "{}", strategy);

            let expected = if strategy.uses_cache() {
                vec![Provenance::Cache]
            } else {
                vec![]
            };
            assert_eq!(
                after_first.iter().map(|r| r.provenance).collect::<Vec<_>>(),
                expected,
                "{}",
                strategy
            );
        }
    }
}
