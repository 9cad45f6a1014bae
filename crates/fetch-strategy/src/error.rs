//! Run error types.

use fetch_core::Provenance;
use fetch_data::FetchError;
use thiserror::Error;

/// Failure that escapes a run.
///
/// Only `cache-fallback-network` produces `Network`/`Decode`: its network
/// attempt after a cache miss has no fallback left, so the failure goes to
/// the caller instead of the log. The other strategies log and end quietly.
#[derive(Error, Debug)]
pub enum RunError {
    /// The last-resort network fetch failed.
    #[error("Network fetch for {url} failed after cache miss: {source}")]
    Network {
        url: String,
        #[source]
        source: FetchError,
    },

    /// A fetched body could not be parsed.
    #[error("Failed to decode {provenance} payload for {url}: {source}")]
    Decode {
        url: String,
        provenance: Provenance,
        #[source]
        source: FetchError,
    },

    /// The spawned run task panicked or was aborted.
    #[error("Run aborted: {0}")]
    Aborted(String),
}
