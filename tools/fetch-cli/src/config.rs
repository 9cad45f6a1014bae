//! CLI configuration.

use anyhow::{Context, Result};
use fetch_core::CacheName;
use fetch_data::TimeoutConfig;
use serde::{Deserialize, Serialize};

/// Endpoints fetched when none are given on the command line.
pub const DEFAULT_ENDPOINTS: [&str; 3] = [
    "https://jsonplaceholder.typicode.com/todos",
    "https://jsonplaceholder.typicode.com/todos/1",
    "https://jsonplaceholder.typicode.com/posts/1",
];

/// CLI configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Defaults for `fetchctl fetch`.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Durable cache location.
    #[serde(default)]
    pub store: StoreConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Endpoints to fetch.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            store: StoreConfig::default(),
            network: NetworkConfig::default(),
            endpoints: default_endpoints(),
        }
    }
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Timeouts for the HTTP fetcher.
    pub fn timeouts(&self) -> TimeoutConfig {
        TimeoutConfig::from_millis(
            self.network.connect_timeout_ms,
            self.network.total_timeout_ms,
        )
    }
}

fn default_endpoints() -> Vec<String> {
    DEFAULT_ENDPOINTS.iter().map(|e| e.to_string()).collect()
}

/// Defaults applied to every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Strategy identifier. Unknown values run network-only.
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Cache to read from and write to.
    #[serde(default)]
    pub cache_name: CacheName,
}

fn default_strategy() -> String {
    "cache-then-network".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            cache_name: CacheName::default(),
        }
    }
}

/// Durable cache location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory, relative to the working directory unless absolute.
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

fn default_store_dir() -> String {
    ".fetchctl/cache".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

/// HTTP client settings. Absent timeouts mean no deadline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Connection timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,

    /// Whole-request timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_timeout_ms: Option<u64>,
}

/// Generate a default fetchctl.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# fetchctl configuration

endpoints = [
    "{todos}",
    "{todo}",
    "{post}",
]

[defaults]
# cache-fallback-network | cache-then-network | network-fallback-cache | network
strategy = "{strategy}"
cache_name = "{cache_name}"

[store]
dir = "{dir}"

[network]
# connect_timeout_ms = 2000
# total_timeout_ms = 10000
"#,
        todos = DEFAULT_ENDPOINTS[0],
        todo = DEFAULT_ENDPOINTS[1],
        post = DEFAULT_ENDPOINTS[2],
        strategy = default_strategy(),
        cache_name = CacheName::default(),
        dir = default_store_dir(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        let defaults = CliConfig::default();

        assert_eq!(config.endpoints, defaults.endpoints);
        assert_eq!(config.defaults.strategy, "cache-then-network");
        assert_eq!(config.defaults.cache_name, CacheName::default());
        assert_eq!(config.store.dir, ".fetchctl/cache");
        assert!(!config.timeouts().is_bounded());
    }

    #[test]
    fn test_partial_config() {
        let config: CliConfig = toml::from_str(
            r#"
[defaults]
strategy = "network"

[network]
total_timeout_ms = 5000
"#,
        )
        .unwrap();

        assert_eq!(config.defaults.strategy, "network");
        assert_eq!(config.endpoints.len(), 3);
        assert_eq!(config.timeouts().total, Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fetchctl.json");
        std::fs::write(
            &path,
            r#"{"endpoints": ["https://x/todos"], "defaults": {"cache_name": "c"}}"#,
        )
        .unwrap();

        let config = CliConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.endpoints, vec!["https://x/todos"]);
        assert_eq!(config.defaults.cache_name, CacheName::new("c"));
        assert_eq!(config.defaults.strategy, "cache-then-network");
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let err = CliConfig::load("/nonexistent/fetchctl.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/fetchctl.toml"));
    }
}
