//! CLI command implementations.

pub mod cache;
pub mod config;
pub mod fetch;
pub mod strategies;

use clap::{Args, Subcommand};

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// URLs to resolve (default: the configured endpoints).
    pub urls: Vec<String>,

    /// Strategy identifier (default: from config).
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Cache to read from and write to (default: from config).
    #[arg(long)]
    pub cache_name: Option<String>,

    /// Print the full payload of the last report.
    #[arg(long)]
    pub full: bool,
}

/// Arguments for the cache command.
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// List cached entries.
    List {
        /// Only list this cache.
        #[arg(long)]
        cache: Option<String>,
    },
    /// Show a cached response.
    Show {
        /// Request URL.
        url: String,
        /// Cache name (default: from config).
        #[arg(long)]
        cache: Option<String>,
    },
    /// Delete a cached response.
    Delete {
        /// Request URL.
        url: String,
        /// Cache name (default: from config).
        #[arg(long)]
        cache: Option<String>,
    },
    /// Delete a whole cache, or every cache.
    Clear {
        /// Cache name (default: all caches).
        cache: Option<String>,
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
