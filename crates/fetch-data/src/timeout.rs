//! Timeout configuration for network fetches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deadlines applied by the HTTP fetcher.
///
/// Both are unset by default: a fetch waits as long as the transport lets
/// it. An exceeded deadline surfaces as an ordinary network failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout.
    #[serde(default, with = "millis", skip_serializing_if = "Option::is_none")]
    pub connect: Option<Duration>,
    /// Total operation timeout.
    #[serde(default, with = "millis", skip_serializing_if = "Option::is_none")]
    pub total: Option<Duration>,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self {
            connect: Some(connect),
            total: Some(total),
        }
    }

    /// Create from a single total timeout; connecting gets a quarter of it.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: Some(Duration::from_millis(total.as_millis() as u64 / 4)),
            total: Some(total),
        }
    }

    /// Create from optional millisecond values (as found in config files).
    pub fn from_millis(connect_ms: Option<u64>, total_ms: Option<u64>) -> Self {
        Self {
            connect: connect_ms.map(Duration::from_millis),
            total: total_ms.map(Duration::from_millis),
        }
    }

    /// Check if any deadline is set.
    pub fn is_bounded(&self) -> bool {
        self.connect.is_some() || self.total.is_some()
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_u64(d.as_millis() as u64),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded() {
        let config = TimeoutConfig::default();
        assert!(!config.is_bounded());
    }

    #[test]
    fn test_from_total() {
        let config = TimeoutConfig::from_total(Duration::from_millis(800));
        assert_eq!(config.connect, Some(Duration::from_millis(200)));
        assert_eq!(config.total, Some(Duration::from_millis(800)));
    }

    #[test]
    fn test_from_millis() {
        let config = TimeoutConfig::from_millis(None, Some(1500));
        assert_eq!(config.connect, None);
        assert_eq!(config.total, Some(Duration::from_millis(1500)));
        assert!(config.is_bounded());
    }

    #[test]
    fn test_serialization_in_millis() {
        let config = TimeoutConfig::new(Duration::from_millis(100), Duration::from_secs(2));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"connect":100,"total":2000}"#);

        let parsed: TimeoutConfig = serde_json::from_str(r#"{"total": 250}"#).unwrap();
        assert_eq!(parsed, TimeoutConfig::from_millis(None, Some(250)));
    }
}
