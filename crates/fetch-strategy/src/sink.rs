//! Result sinks.

use fetch_core::{Payload, Provenance};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};

/// Receives `(payload, provenance)` updates from a run, in call order.
///
/// A run may report more than once (cache then network). The last report
/// before the run quiesces is the steady state.
pub trait ResultSink: Send + Sync {
    /// Accept an update.
    fn report(&self, payload: Payload, provenance: Provenance);
}

/// One delivered update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Reported data.
    pub payload: Payload,
    /// Where the data came from.
    pub provenance: Provenance,
}

/// Sink calling a closure.
pub struct FnSink<F>(F);

/// Wrap a closure as a sink.
pub fn sink_fn<F>(f: F) -> FnSink<F>
where
    F: Fn(Payload, Provenance) + Send + Sync,
{
    FnSink(f)
}

impl<F> ResultSink for FnSink<F>
where
    F: Fn(Payload, Provenance) + Send + Sync,
{
    fn report(&self, payload: Payload, provenance: Provenance) {
        (self.0)(payload, provenance)
    }
}

/// Current value held by a `LatestSink`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinkState {
    /// Last reported payload, or the default payload.
    pub payload: Payload,
    /// Provenance of `payload`; `Default` until something is reported.
    pub provenance: Provenance,
}

/// Sink holding the latest update, starting from a default payload.
///
/// Consumers either read `current()` or `subscribe()` to be woken on
/// every change.
#[derive(Debug)]
pub struct LatestSink {
    tx: watch::Sender<SinkState>,
}

impl LatestSink {
    /// Create a sink whose initial state is `default_payload` with
    /// `Provenance::Default`.
    pub fn new(default_payload: Payload) -> Self {
        let (tx, _rx) = watch::channel(SinkState {
            payload: default_payload,
            provenance: Provenance::Default,
        });
        Self { tx }
    }

    /// Current state.
    pub fn current(&self) -> SinkState {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every update.
    pub fn subscribe(&self) -> watch::Receiver<SinkState> {
        self.tx.subscribe()
    }
}

impl ResultSink for LatestSink {
    fn report(&self, payload: Payload, provenance: Provenance) {
        self.tx.send_replace(SinkState {
            payload,
            provenance,
        });
    }
}

/// Sink keeping every update in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<Report>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All updates so far.
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().clone()
    }

    /// Provenance of each update, in order.
    pub fn provenances(&self) -> Vec<Provenance> {
        self.reports.lock().iter().map(|r| r.provenance).collect()
    }

    /// Number of updates.
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    /// Check if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last update.
    pub fn last(&self) -> Option<Report> {
        self.reports.lock().last().cloned()
    }
}

impl ResultSink for RecordingSink {
    fn report(&self, payload: Payload, provenance: Provenance) {
        self.reports.lock().push(Report {
            payload,
            provenance,
        });
    }
}

/// Sink forwarding updates over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Report>,
}

impl ChannelSink {
    /// Create a sink and the receiving end.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Report>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ResultSink for ChannelSink {
    fn report(&self, payload: Payload, provenance: Provenance) {
        if self
            .tx
            .send(Report {
                payload,
                provenance,
            })
            .is_err()
        {
            tracing::debug!(%provenance, "Report receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fn_sink() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let sink = sink_fn(move |_, provenance| {
            assert_eq!(provenance, Provenance::Cache);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        sink.report(json!(1), Provenance::Cache);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_latest_sink_starts_at_default() {
        let sink = LatestSink::new(json!([]));
        assert_eq!(
            sink.current(),
            SinkState {
                payload: json!([]),
                provenance: Provenance::Default
            }
        );
    }

    #[test]
    fn test_latest_sink_replaces() {
        let sink = LatestSink::new(json!([]));
        sink.report(json!([1]), Provenance::Cache);
        sink.report(json!([1, 2]), Provenance::Network);

        let state = sink.current();
        assert_eq!(state.payload, json!([1, 2]));
        assert_eq!(state.provenance, Provenance::Network);
    }

    #[tokio::test]
    async fn test_latest_sink_notifies_subscribers() {
        let sink = LatestSink::new(json!(null));
        let mut rx = sink.subscribe();

        sink.report(json!({"id": 1}), Provenance::Network);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().provenance, Provenance::Network);
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        assert!(sink.is_empty());

        sink.report(json!("stale"), Provenance::Cache);
        sink.report(json!("fresh"), Provenance::Network);

        assert_eq!(sink.provenances(), vec![Provenance::Cache, Provenance::Network]);
        assert_eq!(sink.last().unwrap().payload, json!("fresh"));
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (sink, mut rx) = ChannelSink::new();
        sink.report(json!(1), Provenance::Cache);

        let report = rx.recv().await.unwrap();
        assert_eq!(report.payload, json!(1));
        assert_eq!(report.provenance, Provenance::Cache);
    }

    #[test]
    fn test_channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.report(json!(1), Provenance::Network);
    }
}
