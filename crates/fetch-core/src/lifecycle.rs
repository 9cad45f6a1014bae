//! Per-run resolution lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::provenance::Provenance;

/// Monotonic identifier of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    /// Allocate the next process-wide run id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Create from a raw value.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Resolution phase of a single run.
///
/// Transitions only move toward a resolved phase. The one permitted move
/// between resolved phases is `Resolved(Cache)` to `Resolved(Network)`,
/// when fresh network data supersedes an earlier cache report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "source")]
pub enum RunPhase {
    /// Nothing started, or the run ended without any report.
    #[default]
    Default,
    /// I/O in flight, nothing reported yet.
    Resolving,
    /// A payload has been reported from this source.
    Resolved(Provenance),
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("run already started")]
    AlreadyStarted,

    #[error("run has not started")]
    NotStarted,

    #[error("cannot resolve to the default provenance")]
    DefaultSource,

    #[error("already resolved from {0}")]
    AlreadyResolved(Provenance),

    #[error("cache data cannot supersede network data")]
    StaleAfterFresh,
}

impl RunPhase {
    /// Begin resolving.
    pub fn start(self) -> Result<Self, TransitionError> {
        match self {
            Self::Default => Ok(Self::Resolving),
            _ => Err(TransitionError::AlreadyStarted),
        }
    }

    /// Record a report from `source`.
    pub fn resolve(self, source: Provenance) -> Result<Self, TransitionError> {
        if source == Provenance::Default {
            return Err(TransitionError::DefaultSource);
        }

        match (self, source) {
            (Self::Default, _) => Err(TransitionError::NotStarted),
            (Self::Resolving, source) => Ok(Self::Resolved(source)),
            (Self::Resolved(Provenance::Cache), Provenance::Network) => {
                Ok(Self::Resolved(Provenance::Network))
            }
            (Self::Resolved(Provenance::Network), Provenance::Cache) => {
                Err(TransitionError::StaleAfterFresh)
            }
            (Self::Resolved(current), _) => Err(TransitionError::AlreadyResolved(current)),
        }
    }

    /// End the run. A run that never resolved falls back to `Default`.
    pub fn finish(self) -> Self {
        match self {
            Self::Resolving => Self::Default,
            other => other,
        }
    }

    /// Provenance of the data the consumer currently holds for this run.
    pub fn provenance(&self) -> Provenance {
        match self {
            Self::Resolved(source) => *source,
            _ => Provenance::Default,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Resolving => write!(f, "resolving"),
            Self::Resolved(source) => write!(f, "resolved({})", source),
        }
    }
}
