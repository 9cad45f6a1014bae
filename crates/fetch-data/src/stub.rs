//! Scripted fetcher for tests and offline runs.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use fetch_core::RequestDescriptor;
use parking_lot::Mutex;
use serde::Serialize;

use crate::{FetchError, Fetcher, Response};

/// Scripted result for a URL.
#[derive(Debug, Clone)]
pub enum StubOutcome {
    /// Respond with this response.
    Respond(Response),
    /// Fail with a connection error carrying this message.
    Fail(String),
}

#[derive(Debug, Default)]
struct StubState {
    routes: HashMap<String, StubOutcome>,
    latency: HashMap<String, Duration>,
    calls: HashMap<String, usize>,
}

/// Fetcher answering from a table of scripted outcomes keyed by canonical URL.
///
/// Unscripted URLs fail as unreachable. Each route can carry a latency so
/// that races against a cache can be ordered under a paused tokio clock.
#[derive(Debug, Default)]
pub struct StubFetcher {
    state: Mutex<StubState>,
}

impl StubFetcher {
    /// Create a fetcher with no routes (everything is unreachable).
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for a URL.
    pub fn set_response(&self, url: &str, response: Response) {
        self.set_outcome(url, StubOutcome::Respond(response));
    }

    /// Script a JSON response for a URL.
    pub fn set_json<T: Serialize>(&self, url: &str, status: u16, value: &T) {
        match Response::json_body(status, value) {
            Ok(response) => self.set_response(url, response.with_url(url)),
            Err(e) => self.set_outcome(url, StubOutcome::Fail(e.to_string())),
        }
    }

    /// Script a failure for a URL.
    pub fn set_failure(&self, url: &str, message: impl Into<String>) {
        self.set_outcome(url, StubOutcome::Fail(message.into()));
    }

    /// Script an arbitrary outcome for a URL.
    pub fn set_outcome(&self, url: &str, outcome: StubOutcome) {
        let key = RequestDescriptor::new(url).canonical_url();
        self.state.lock().routes.insert(key, outcome);
    }

    /// Delay every fetch of a URL by `latency`.
    pub fn set_latency(&self, url: &str, latency: Duration) {
        let key = RequestDescriptor::new(url).canonical_url();
        self.state.lock().latency.insert(key, latency);
    }

    /// Total number of fetches performed.
    pub fn calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    /// Number of fetches performed for a URL.
    pub fn calls_for(&self, url: &str) -> usize {
        let key = RequestDescriptor::new(url).canonical_url();
        self.state.lock().calls.get(&key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError> {
        let key = request.canonical_url();

        let (outcome, latency) = {
            let mut state = self.state.lock();
            *state.calls.entry(key.clone()).or_insert(0) += 1;
            (
                state.routes.get(&key).cloned(),
                state.latency.get(&key).copied(),
            )
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match outcome {
            Some(StubOutcome::Respond(response)) => Ok(response),
            Some(StubOutcome::Fail(message)) => Err(FetchError::Connection(message)),
            None => Err(FetchError::Connection(format!("{} is unreachable", key))),
        }
    }
}
