//! Network only.

use async_trait::async_trait;
use fetch_core::Provenance;

use super::Algorithm;
use crate::error::RunError;
use crate::run::Run;
use crate::strategy::Strategy;

/// Fetch from the network and report. The cache is never touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkOnly;

#[async_trait]
impl Algorithm for NetworkOnly {
    fn strategy(&self) -> Strategy {
        Strategy::Network
    }

    async fn run(&self, run: &Run) -> Result<(), RunError> {
        let payload = match run.fetch_network().await {
            Ok(response) => response.json(),
            Err(e) => Err(e),
        };

        match payload {
            Ok(payload) => {
                run.report(payload, Provenance::Network);
            }
            Err(e) => {
                tracing::warn!(
                    url = %run.request(),
                    error = %e,
                    "Failed to fetch from the network. Not checking cache."
                );
            }
        }
        Ok(())
    }
}
