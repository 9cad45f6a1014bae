//! Cache first, network on miss.

use async_trait::async_trait;
use fetch_core::Provenance;

use super::Algorithm;
use crate::error::RunError;
use crate::run::Run;
use crate::strategy::Strategy;

/// Serve from the cache; on a miss fetch from the network, store a clone
/// and serve that.
///
/// The network fetch after a miss is the one failure in the crate that
/// propagates: its error is returned to the caller instead of logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheFallbackNetwork;

#[async_trait]
impl Algorithm for CacheFallbackNetwork {
    fn strategy(&self) -> Strategy {
        Strategy::CacheFallbackNetwork
    }

    async fn run(&self, run: &Run) -> Result<(), RunError> {
        let url = run.request().to_string();

        match run.lookup_cache().await {
            Some(cached) => match cached.json() {
                Ok(payload) => {
                    run.report(payload, Provenance::Cache);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e, "Cached entry is unreadable. Trying network...");
                }
            },
            None => {
                tracing::info!(%url, "Failed to find cache. Trying network...");
            }
        }

        let response = run
            .fetch_network()
            .await
            .map_err(|source| RunError::Network {
                url: url.clone(),
                source,
            })?;

        run.store_response(response.clone()).await;

        let payload = response.json().map_err(|source| RunError::Decode {
            url,
            provenance: Provenance::Network,
            source,
        })?;
        run.report(payload, Provenance::Network);
        Ok(())
    }
}
