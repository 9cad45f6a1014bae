//! Per-run state shared by the branches of an algorithm.

use std::sync::Arc;

use fetch_cache::CacheStore;
use fetch_core::{
    CacheName, FetchConfig, Payload, Provenance, RequestDescriptor, RunId, RunPhase,
    TransitionError,
};
use fetch_data::{FetchError, Fetcher, Response};
use parking_lot::Mutex;

use crate::sink::ResultSink;

#[derive(Debug, Default)]
struct RunState {
    phase: RunPhase,
    network_reported: bool,
    reports: usize,
}

/// One orchestration run: what to resolve, the capabilities to resolve it
/// with, and the state that decides which reports reach the sink.
///
/// Every report goes through `report`, which advances the run's
/// `RunPhase` under a lock before calling the sink. A cache report that
/// arrives after a network report is refused by the phase machine, so the
/// supersede rule holds no matter how the branches interleave.
pub struct Run {
    id: RunId,
    request: RequestDescriptor,
    cache_name: CacheName,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn ResultSink>,
    state: Mutex<RunState>,
}

impl Run {
    /// Create a run in the `Default` phase.
    pub fn new(
        id: RunId,
        config: &FetchConfig,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            id,
            request: config.request.clone(),
            cache_name: config.cache_name.clone(),
            store,
            fetcher,
            sink,
            state: Mutex::new(RunState::default()),
        }
    }

    /// Request being resolved.
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    /// Cache consulted and written by this run.
    pub fn cache_name(&self) -> &CacheName {
        &self.cache_name
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.state.lock().phase
    }

    /// Whether network data has already been reported.
    pub fn network_reported(&self) -> bool {
        self.state.lock().network_reported
    }

    /// Number of reports delivered to the sink.
    pub fn reports(&self) -> usize {
        self.state.lock().reports
    }

    /// Move from `Default` to `Resolving`.
    pub fn start(&self) -> Result<(), TransitionError> {
        let mut state = self.state.lock();
        state.phase = state.phase.start()?;
        Ok(())
    }

    /// End the run and return its final phase.
    pub fn finish(&self) -> RunPhase {
        let mut state = self.state.lock();
        state.phase = state.phase.finish();
        state.phase
    }

    /// Deliver a payload to the sink if the phase machine accepts it.
    ///
    /// Returns `false` when the report was suppressed.
    pub fn report(&self, payload: Payload, source: Provenance) -> bool {
        let mut state = self.state.lock();

        match state.phase.resolve(source) {
            Ok(next) => {
                state.phase = next;
                state.reports += 1;
                if source == Provenance::Network {
                    state.network_reported = true;
                }
                tracing::debug!(run_id = %self.id, url = %self.request, %source, "Reporting payload");
                self.sink.report(payload, source);
                true
            }
            Err(TransitionError::StaleAfterFresh) => {
                tracing::debug!(
                    run_id = %self.id,
                    url = %self.request,
                    "Network data already reported, suppressing cache data"
                );
                false
            }
            Err(e) => {
                tracing::warn!(run_id = %self.id, url = %self.request, %source, error = %e, "Report rejected");
                false
            }
        }
    }

    /// Perform the network fetch.
    pub async fn fetch_network(&self) -> Result<Response, FetchError> {
        self.fetcher.fetch(&self.request).await
    }

    /// Look up the request in the cache.
    ///
    /// An unavailable store or a failed lookup is logged and treated as a miss.
    pub async fn lookup_cache(&self) -> Option<Response> {
        let cache = match self.store.open(&self.cache_name).await {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!(
                    url = %self.request,
                    cache_name = %self.cache_name,
                    error = %e,
                    "Failed to fetch from cache"
                );
                return None;
            }
        };

        match cache.match_request(&self.request).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    url = %self.request,
                    cache_name = %self.cache_name,
                    error = %e,
                    "Failed to fetch from cache"
                );
                None
            }
        }
    }

    /// Store a response clone in the cache. Failures are logged and swallowed.
    pub async fn store_response(&self, response: Response) {
        tracing::info!(
            url = %self.request,
            cache_name = %self.cache_name,
            "Creating cache entry"
        );

        let result = match self.store.open(&self.cache_name).await {
            Ok(cache) => cache.put(&self.request, response).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(
                url = %self.request,
                cache_name = %self.cache_name,
                error = %e,
                "Failed to create cache entry"
            );
        }
    }
}

impl std::fmt::Debug for Run {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("cache_name", &self.cache_name)
            .field("state", &*self.state.lock())
            .finish()
    }
}
