//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use fetch_cache::FileCacheStore;
use fetch_data::HttpFetcher;
use fetch_strategy::Orchestrator;

use crate::config::CliConfig;
use crate::output::Output;

/// Config file names searched for, in order, in each directory.
pub const CONFIG_NAMES: [&str; 3] = ["fetchctl.toml", ".fetchctl.toml", "fetchctl.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            match find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Root directory of the durable cache.
    pub fn store_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.store.dir)
    }

    /// Durable cache store.
    pub fn cache_store(&self) -> FileCacheStore {
        FileCacheStore::new(self.store_dir())
    }

    /// Orchestrator over the durable cache and an HTTP fetcher.
    pub fn orchestrator(&self) -> Result<Orchestrator> {
        let fetcher = HttpFetcher::with_timeouts(self.config.timeouts())
            .context("Failed to build HTTP client")?;
        Ok(Orchestrator::new(
            Arc::new(self.cache_store()),
            Arc::new(fetcher),
        ))
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}

/// Find a config file in `start` or its parents.
fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
    let mut current = start.to_path_buf();
    loop {
        for name in &CONFIG_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                    return Some((config, config_path));
                }
            }
        }

        if !current.pop() {
            break;
        }
    }

    None
}
