//! Network first, cache on failure.

use async_trait::async_trait;
use fetch_core::Provenance;

use super::Algorithm;
use crate::error::RunError;
use crate::run::Run;
use crate::strategy::Strategy;

/// Fetch from the network, storing successful responses. If the fetch or
/// its body fails, serve from the cache instead. With neither source
/// available the run ends without a report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkFallbackCache;

#[async_trait]
impl Algorithm for NetworkFallbackCache {
    fn strategy(&self) -> Strategy {
        Strategy::NetworkFallbackCache
    }

    async fn run(&self, run: &Run) -> Result<(), RunError> {
        let failure = match run.fetch_network().await {
            Ok(response) => {
                if response.is_ok() {
                    run.store_response(response.clone()).await;
                }
                match response.json() {
                    Ok(payload) => {
                        run.report(payload, Provenance::Network);
                        return Ok(());
                    }
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        tracing::warn!(
            url = %run.request(),
            cache_name = %run.cache_name(),
            error = %failure,
            "Failed to fetch from the network. Attempting to read from cache"
        );

        let cached = match run.lookup_cache().await {
            Some(cached) => cached.json().map_err(|e| e.to_string()),
            None => Err("no cache entry".to_string()),
        };

        match cached {
            Ok(payload) => {
                run.report(payload, Provenance::Cache);
            }
            Err(reason) => {
                tracing::warn!(
                    url = %run.request(),
                    error = %reason,
                    "Failed to fetch from the cache (and network)"
                );
            }
        }
        Ok(())
    }
}
