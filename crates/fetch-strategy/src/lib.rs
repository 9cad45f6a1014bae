//! Caching strategies layered over a network fetch.
//!
//! Given a request, a named cache and a strategy identifier, a run resolves
//! to one or more `(payload, provenance)` reports delivered to a
//! `ResultSink`:
//!
//! - `cache-fallback-network` - cache first, network on miss
//! - `cache-then-network` - race both, fresh network data supersedes cache
//! - `network-fallback-cache` - network first, cache on failure
//! - `network` - network only, no caching
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use fetch_cache::MemoryCacheStore;
//! use fetch_core::FetchConfig;
//! use fetch_data::HttpFetcher;
//! use fetch_strategy::{LatestSink, Orchestrator};
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::new(MemoryCacheStore::new()),
//!     Arc::new(HttpFetcher::new()?),
//! );
//! let sink = Arc::new(LatestSink::new(serde_json::json!([])));
//! let slot = orchestrator.slot(sink.clone());
//!
//! let handle = slot.dispatch(
//!     &FetchConfig::new("https://jsonplaceholder.typicode.com/todos")
//!         .with_strategy("cache-then-network"),
//! );
//! handle.wait().await?;
//! println!("{} from {}", sink.current().payload, sink.current().provenance);
//! ```

mod algorithms;
mod error;
mod orchestrator;
mod resolver;
mod run;
mod sink;
mod strategy;

pub use algorithms::{
    Algorithm, CacheFallbackNetwork, CacheThenNetwork, NetworkFallbackCache, NetworkOnly,
};
pub use error::RunError;
pub use orchestrator::{FetchSlot, Orchestrator, RunHandle, RunSummary};
pub use resolver::{Resolution, StrategyDiagnostic, StrategyResolver};
pub use run::Run;
pub use sink::{sink_fn, ChannelSink, FnSink, LatestSink, RecordingSink, Report, ResultSink, SinkState};
pub use strategy::{Strategy, UnknownStrategy};
