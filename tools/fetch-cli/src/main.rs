//! fetchctl - Command line tool for the caching strategy orchestrator.
//!
//! Commands:
//! - `fetchctl fetch` - Resolve endpoints through a caching strategy
//! - `fetchctl strategies` - List the available strategies
//! - `fetchctl cache` - Inspect and clear the durable cache
//! - `fetchctl config` - Manage configuration

mod commands;
mod config;
mod context;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{CacheArgs, ConfigArgs, FetchArgs};

/// fetchctl - Run caching strategies against HTTP endpoints
#[derive(Parser)]
#[command(name = "fetchctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve endpoints through a caching strategy
    Fetch(FetchArgs),

    /// List the available strategies
    Strategies,

    /// Inspect and clear the durable cache
    Cache(CacheArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.log_json);

    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    let result = match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, &ctx).await,
        Commands::Strategies => commands::strategies::run(&ctx).await,
        Commands::Cache(args) => commands::cache::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
