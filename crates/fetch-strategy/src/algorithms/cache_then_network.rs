//! Cache and network raced, network supersedes.

use async_trait::async_trait;
use fetch_core::Provenance;

use super::Algorithm;
use crate::error::RunError;
use crate::run::Run;
use crate::strategy::Strategy;

/// Race a cache lookup against a network fetch.
///
/// Whichever of the two arrives first is reported. A cache hit that lands
/// after the network has reported is suppressed, so the sink sees at most
/// `Cache` then `Network`, never the reverse. A cache miss leaves the
/// network branch as the only source.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheThenNetwork;

impl CacheThenNetwork {
    async fn network_branch(run: &Run) {
        let response = match run.fetch_network().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %run.request(), error = %e, "Failed to fetch from the network");
                return;
            }
        };

        if response.is_ok() {
            run.store_response(response.clone()).await;
        }

        match response.json() {
            Ok(payload) => {
                run.report(payload, Provenance::Network);
            }
            Err(e) => {
                tracing::warn!(url = %run.request(), error = %e, "Failed to fetch from the network");
            }
        }
    }

    async fn cache_branch(run: &Run) {
        let Some(cached) = run.lookup_cache().await else {
            tracing::debug!(url = %run.request(), "No cached data, waiting on network");
            return;
        };

        match cached.json() {
            Ok(payload) => {
                if run.network_reported() {
                    tracing::debug!(url = %run.request(), "Network data already reported, skipping cache");
                    return;
                }
                run.report(payload, Provenance::Cache);
            }
            Err(e) => {
                tracing::debug!(url = %run.request(), error = %e, "Cached entry is unreadable, waiting on network");
            }
        }
    }
}

#[async_trait]
impl Algorithm for CacheThenNetwork {
    fn strategy(&self) -> Strategy {
        Strategy::CacheThenNetwork
    }

    async fn run(&self, run: &Run) -> Result<(), RunError> {
        tokio::join!(Self::network_branch(run), Self::cache_branch(run));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::fixture::{Harness, URL};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_network_first_suppresses_cache() {
        let harness = Harness::new();
        harness.seed(&json!("stale"));
        harness.store.set_read_latency(Some(Duration::from_millis(50)));
        harness.fetcher.set_json(URL, 200, &json!("fresh"));
        harness.fetcher.set_latency(URL, Duration::from_millis(10));

        harness.execute(&CacheThenNetwork).await.unwrap();

        assert_eq!(harness.provenances(), vec![Provenance::Network]);
        assert_eq!(harness.sink.last().unwrap().payload, json!("fresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_first_then_network() {
        let harness = Harness::new();
        harness.seed(&json!("stale"));
        harness.store.set_read_latency(Some(Duration::from_millis(10)));
        harness.fetcher.set_json(URL, 200, &json!("fresh"));
        harness.fetcher.set_latency(URL, Duration::from_millis(50));

        harness.execute(&CacheThenNetwork).await.unwrap();

        let reports = harness.sink.reports();
        assert_eq!(harness.provenances(), vec![Provenance::Cache, Provenance::Network]);
        assert_eq!(reports[0].payload, json!("stale"));
        assert_eq!(reports[1].payload, json!("fresh"));
    }

    #[tokio::test]
    async fn test_cache_miss_reports_network_once() {
        let harness = Harness::new();
        harness.fetcher.set_json(URL, 200, &json!([1]));

        harness.execute(&CacheThenNetwork).await.unwrap();

        assert_eq!(harness.provenances(), vec![Provenance::Network]);
    }

    #[tokio::test]
    async fn test_cache_unavailable_reports_network_once() {
        let harness = Harness::new();
        harness.store.set_unavailable(true);
        harness.fetcher.set_json(URL, 200, &json!([1]));

        harness.execute(&CacheThenNetwork).await.unwrap();

        assert_eq!(harness.provenances(), vec![Provenance::Network]);
    }

    #[tokio::test]
    async fn test_network_failure_keeps_cache_report() {
        let harness = Harness::new();
        harness.seed(&json!("stale"));
        harness.fetcher.set_failure(URL, "offline");

        harness.execute(&CacheThenNetwork).await.unwrap();

        assert_eq!(harness.provenances(), vec![Provenance::Cache]);
    }

    #[tokio::test]
    async fn test_total_failure_reports_nothing() {
        let harness = Harness::new();
        harness.fetcher.set_failure(URL, "offline");

        harness.execute(&CacheThenNetwork).await.unwrap();

        assert!(harness.sink.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_reported_but_not_stored() {
        let harness = Harness::new();
        harness.fetcher.set_json(URL, 500, &json!({"error": "boom"}));

        harness.execute(&CacheThenNetwork).await.unwrap();

        assert_eq!(harness.provenances(), vec![Provenance::Network]);
        assert!(!harness.cached());
    }

    #[tokio::test]
    async fn test_empty_cache_end_to_end() {
        let harness = Harness::new();
        harness.fetcher.set_json(URL, 200, &json!([{"id": 1}]));

        harness.execute(&CacheThenNetwork).await.unwrap();

        let reports = harness.sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].payload, json!([{"id": 1}]));
        assert_eq!(reports[0].provenance, Provenance::Network);
        assert!(harness.cached());
        assert_eq!(harness.store.len(&Harness::cache_name()), 1);
    }
}
