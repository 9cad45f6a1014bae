//! Reported data and where it came from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured data parsed from a response body. No schema is imposed.
pub type Payload = serde_json::Value;

/// Origin of the currently reported payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Placeholder state before any resolution completes.
    #[default]
    Default,
    /// Served from the durable cache.
    Cache,
    /// Served from the network.
    Network,
}

impl Provenance {
    /// Lowercase tag for this provenance.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Cache => "cache",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
