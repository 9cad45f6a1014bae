//! Orchestrator: resolves a strategy and drives a run against the injected
//! cache store and fetcher.
//!
//! Runs are either awaited in place (`Orchestrator::run`) or spawned onto
//! the tokio runtime (`Orchestrator::dispatch`), in which case the caller
//! gets a `RunHandle` back immediately and reports arrive asynchronously.
//! A `FetchSlot` ties successive dispatches to one sink and drops reports
//! from runs that a later dispatch has replaced.

use std::sync::Arc;

use fetch_cache::CacheStore;
use fetch_core::{FetchConfig, Payload, Provenance, RunId, RunPhase};
use fetch_data::Fetcher;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::error::RunError;
use crate::resolver::{Resolution, StrategyDiagnostic, StrategyResolver};
use crate::run::Run;
use crate::sink::ResultSink;
use crate::strategy::Strategy;

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Run identifier.
    pub run_id: RunId,
    /// Strategy that was executed.
    pub strategy: Strategy,
    /// Final phase. `Default` means nothing was reported.
    pub phase: RunPhase,
    /// Number of reports the run emitted.
    pub reports: usize,
    /// Set when the strategy identifier was coerced to network-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<StrategyDiagnostic>,
}

impl RunSummary {
    /// Provenance of the last report, or `Default`.
    pub fn provenance(&self) -> Provenance {
        self.phase.provenance()
    }
}

/// Entry point for running strategies.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    resolver: StrategyResolver,
}

impl Orchestrator {
    /// Create an orchestrator over a cache store and a fetcher.
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            store,
            fetcher,
            resolver: StrategyResolver::new(),
        }
    }

    /// Use a custom resolver (e.g. one with a diagnostic hook).
    pub fn with_resolver(mut self, resolver: StrategyResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Run to completion on the current task.
    ///
    /// Returns an error only for `cache-fallback-network` when the network
    /// fetch after a cache miss fails.
    pub async fn run(
        &self,
        config: &FetchConfig,
        sink: Arc<dyn ResultSink>,
    ) -> Result<RunSummary, RunError> {
        let resolution = self.resolver.resolve(config.strategy_id());
        self.execute(RunId::next(), resolution, config, sink).await
    }

    /// Spawn a run and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, config: &FetchConfig, sink: Arc<dyn ResultSink>) -> RunHandle {
        self.dispatch_as(RunId::next(), config, sink)
    }

    /// Create a slot delivering to `sink`.
    pub fn slot(&self, sink: Arc<dyn ResultSink>) -> FetchSlot {
        FetchSlot {
            orchestrator: self.clone(),
            sink,
            current: Arc::new(Mutex::new(None)),
        }
    }

    fn dispatch_as(
        &self,
        run_id: RunId,
        config: &FetchConfig,
        sink: Arc<dyn ResultSink>,
    ) -> RunHandle {
        let resolution = self.resolver.resolve(config.strategy_id());

        let orchestrator = self.clone();
        let config = config.clone();
        let task_resolution = resolution.clone();
        let handle = tokio::spawn(async move {
            orchestrator
                .execute(run_id, task_resolution, &config, sink)
                .await
        });

        RunHandle {
            run_id,
            resolution,
            handle,
        }
    }

    async fn execute(
        &self,
        run_id: RunId,
        resolution: Resolution,
        config: &FetchConfig,
        sink: Arc<dyn ResultSink>,
    ) -> Result<RunSummary, RunError> {
        let span = tracing::info_span!(
            "run",
            %run_id,
            strategy = %resolution.strategy,
            url = %config.request,
            cache_name = %config.cache_name
        );

        async move {
            let run = Run::new(
                run_id,
                config,
                Arc::clone(&self.store),
                Arc::clone(&self.fetcher),
                sink,
            );
            if let Err(e) = run.start() {
                return Err(RunError::Aborted(e.to_string()));
            }

            tracing::debug!("Run started");
            let result = resolution.algorithm().run(&run).await;
            let phase = run.finish();

            match &result {
                Ok(()) => tracing::debug!(%phase, reports = run.reports(), "Run finished"),
                Err(e) => tracing::warn!(%phase, error = %e, "Run failed"),
            }

            result.map(|()| RunSummary {
                run_id,
                strategy: resolution.strategy,
                phase,
                reports: run.reports(),
                diagnostic: resolution.diagnostic,
            })
        }
        .instrument(span)
        .await
    }
}

/// Handle to a spawned run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    resolution: Resolution,
    handle: JoinHandle<Result<RunSummary, RunError>>,
}

impl RunHandle {
    /// Run identifier.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Strategy being executed.
    pub fn strategy(&self) -> Strategy {
        self.resolution.strategy
    }

    /// Coercion diagnostic, if the identifier was not recognized.
    pub fn diagnostic(&self) -> Option<&StrategyDiagnostic> {
        self.resolution.diagnostic.as_ref()
    }

    /// Check if the run has completed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the run. Reports already delivered stay delivered.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the run to complete.
    pub async fn wait(self) -> Result<RunSummary, RunError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(RunError::Aborted(e.to_string())),
        }
    }
}

/// A sink plus the token of the run currently allowed to report into it.
///
/// Every `dispatch` starts a new run and makes it current; reports from
/// earlier runs that complete late are dropped.
#[derive(Clone)]
pub struct FetchSlot {
    orchestrator: Orchestrator,
    sink: Arc<dyn ResultSink>,
    current: Arc<Mutex<Option<RunId>>>,
}

impl FetchSlot {
    /// Start a run that replaces any earlier one.
    pub fn dispatch(&self, config: &FetchConfig) -> RunHandle {
        let run_id = RunId::next();
        *self.current.lock() = Some(run_id);

        let sink = Arc::new(GuardedSink {
            run_id,
            current: Arc::clone(&self.current),
            inner: Arc::clone(&self.sink),
        });
        self.orchestrator.dispatch_as(run_id, config, sink)
    }

    /// Run currently allowed to report.
    pub fn current_run(&self) -> Option<RunId> {
        *self.current.lock()
    }

    /// Stop accepting reports from every dispatched run.
    ///
    /// A report that already passed its token check when this is called may
    /// still be delivered.
    pub fn invalidate(&self) {
        *self.current.lock() = None;
    }
}

struct GuardedSink {
    run_id: RunId,
    current: Arc<Mutex<Option<RunId>>>,
    inner: Arc<dyn ResultSink>,
}

impl ResultSink for GuardedSink {
    fn report(&self, payload: Payload, provenance: Provenance) {
        // The lock is released before delivery so the inner sink may call
        // back into the slot.
        let is_current = *self.current.lock() == Some(self.run_id);
        if is_current {
            self.inner.report(payload, provenance);
        } else {
            tracing::debug!(run_id = %self.run_id, %provenance, "Dropping report from superseded run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{sink_fn, LatestSink, RecordingSink};
    use fetch_cache::MemoryCacheStore;
    use fetch_core::CacheName;
    use fetch_data::StubFetcher;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const TODOS: &str = "https://x/todos";

    fn setup() -> (Orchestrator, Arc<MemoryCacheStore>, Arc<StubFetcher>) {
        let store = Arc::new(MemoryCacheStore::new());
        let fetcher = Arc::new(StubFetcher::new());
        (Orchestrator::new(store.clone(), fetcher.clone()), store, fetcher)
    }

    #[tokio::test]
    async fn test_end_to_end_cache_then_network() {
        let (orchestrator, store, fetcher) = setup();
        fetcher.set_json(TODOS, 200, &json!([{"id": 1}]));
        let sink = Arc::new(RecordingSink::new());

        let config = FetchConfig::new(TODOS)
            .with_cache_name("c")
            .with_strategy("cache-then-network");
        let summary = orchestrator.run(&config, sink.clone()).await.unwrap();

        assert_eq!(summary.strategy, Strategy::CacheThenNetwork);
        assert_eq!(summary.phase, RunPhase::Resolved(Provenance::Network));
        assert_eq!(summary.reports, 1);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.last().unwrap().payload, json!([{"id": 1}]));
        assert!(store.contains(&CacheName::new("c"), &config.request));
    }

    #[tokio::test]
    async fn test_unrecognized_strategy_runs_network_only() {
        let diagnostics = Arc::new(AtomicUsize::new(0));
        let seen = diagnostics.clone();
        let (orchestrator, store, fetcher) = setup();
        let orchestrator = orchestrator.with_resolver(
            StrategyResolver::new().on_diagnostic(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );
        fetcher.set_json(TODOS, 200, &json!([]));
        let sink = Arc::new(RecordingSink::new());

        let config = FetchConfig::new(TODOS).with_strategy("bogus");
        let summary = orchestrator.run(&config, sink.clone()).await.unwrap();

        assert_eq!(summary.strategy, Strategy::Network);
        assert!(matches!(
            summary.diagnostic,
            Some(StrategyDiagnostic::Unrecognized { .. })
        ));
        assert_eq!(diagnostics.load(Ordering::SeqCst), 1);
        assert_eq!(sink.provenances(), vec![Provenance::Network]);
        assert_eq!(store.stats().total(), 0);
    }

    #[tokio::test]
    async fn test_total_failure_summary_is_default() {
        let (orchestrator, _store, _fetcher) = setup();
        let sink = Arc::new(LatestSink::new(json!([])));

        let config = FetchConfig::new(TODOS).with_strategy("network-fallback-cache");
        let summary = orchestrator.run(&config, sink.clone()).await.unwrap();

        assert_eq!(summary.phase, RunPhase::Default);
        assert_eq!(summary.provenance(), Provenance::Default);
        assert_eq!(summary.reports, 0);
        assert_eq!(sink.current().payload, json!([]));
    }

    #[tokio::test]
    async fn test_dispatch_surfaces_cache_fallback_network_failure() {
        let (orchestrator, _store, fetcher) = setup();
        fetcher.set_failure(TODOS, "offline");

        let config = FetchConfig::new(TODOS).with_strategy("cache-fallback-network");
        let handle = orchestrator.dispatch(&config, Arc::new(RecordingSink::new()));
        assert_eq!(handle.strategy(), Strategy::CacheFallbackNetwork);
        assert!(handle.diagnostic().is_none());

        assert!(matches!(handle.wait().await, Err(RunError::Network { .. })));
    }

    #[tokio::test]
    async fn test_aborted_run() {
        let (orchestrator, _store, fetcher) = setup();
        fetcher.set_json(TODOS, 200, &json!([]));

        let handle = orchestrator.dispatch(&FetchConfig::new(TODOS), Arc::new(RecordingSink::new()));
        handle.abort();

        assert!(matches!(handle.wait().await, Err(RunError::Aborted(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_drops_reports_from_superseded_run() {
        let (orchestrator, _store, fetcher) = setup();
        fetcher.set_json("https://x/todos/1", 200, &json!("old"));
        fetcher.set_latency("https://x/todos/1", Duration::from_millis(50));
        fetcher.set_json("https://x/todos/2", 200, &json!("new"));
        fetcher.set_latency("https://x/todos/2", Duration::from_millis(10));

        let sink = Arc::new(RecordingSink::new());
        let slot = orchestrator.slot(sink.clone());

        let first = slot.dispatch(&FetchConfig::new("https://x/todos/1").with_strategy("network"));
        let second = slot.dispatch(&FetchConfig::new("https://x/todos/2").with_strategy("network"));
        assert_eq!(slot.current_run(), Some(second.run_id()));

        second.wait().await.unwrap();
        first.wait().await.unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.last().unwrap().payload, json!("new"));
    }

    #[tokio::test]
    async fn test_sink_can_redispatch_into_its_own_slot() {
        let (orchestrator, _store, fetcher) = setup();
        fetcher.set_json("https://x/todos/1", 200, &json!("first"));
        fetcher.set_json("https://x/todos/2", 200, &json!("second"));

        let slot_cell: Arc<Mutex<Option<FetchSlot>>> = Arc::new(Mutex::new(None));
        let follow_up: Arc<Mutex<Option<RunHandle>>> = Arc::new(Mutex::new(None));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = {
            let slot_cell = Arc::clone(&slot_cell);
            let follow_up = Arc::clone(&follow_up);
            let seen = Arc::clone(&seen);
            Arc::new(sink_fn(move |payload, _provenance| {
                seen.lock().push(payload.clone());
                let slot = slot_cell.lock().clone();
                if let Some(slot) = slot {
                    assert!(slot.current_run().is_some());
                    if payload == json!("first") {
                        let handle = slot.dispatch(
                            &FetchConfig::new("https://x/todos/2").with_strategy("network"),
                        );
                        *follow_up.lock() = Some(handle);
                    }
                }
            }))
        };

        let slot = orchestrator.slot(sink);
        *slot_cell.lock() = Some(slot.clone());

        let first = slot.dispatch(&FetchConfig::new("https://x/todos/1").with_strategy("network"));
        tokio::time::timeout(Duration::from_secs(3), first.wait())
            .await
            .unwrap()
            .unwrap();

        let second = follow_up.lock().take().unwrap();
        assert_eq!(slot.current_run(), Some(second.run_id()));
        tokio::time::timeout(Duration::from_secs(3), second.wait())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(*seen.lock(), vec![json!("first"), json!("second")]);
        slot_cell.lock().take();
    }

    #[tokio::test]
    async fn test_slot_invalidate_silences_runs() {
        let (orchestrator, _store, fetcher) = setup();
        fetcher.set_json(TODOS, 200, &json!([1]));

        let sink = Arc::new(RecordingSink::new());
        let slot = orchestrator.slot(sink.clone());

        let handle = slot.dispatch(&FetchConfig::new(TODOS));
        slot.invalidate();
        assert_eq!(slot.current_run(), None);

        let summary = handle.wait().await.unwrap();
        assert_eq!(summary.reports, 1);
        assert!(sink.is_empty());
    }
}
