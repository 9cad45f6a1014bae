//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use fetch_strategy::Strategy;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(built-in defaults)"),
    }

    ctx.output.info("");
    ctx.output.info("[defaults]");
    ctx.output.kv("strategy", &ctx.config.defaults.strategy);
    ctx.output.kv("cache_name", ctx.config.defaults.cache_name.as_str());

    ctx.output.info("");
    ctx.output.info("[store]");
    ctx.output.kv("dir", &ctx.store_dir().display().to_string());

    ctx.output.info("");
    ctx.output.info("[network]");
    let millis = |v: Option<u64>| v.map(|ms| format!("{}ms", ms)).unwrap_or_else(|| "none".to_string());
    ctx.output
        .kv("connect_timeout", &millis(ctx.config.network.connect_timeout_ms));
    ctx.output
        .kv("total_timeout", &millis(ctx.config.network.total_timeout_ms));

    ctx.output.info("");
    ctx.output.info("Endpoints:");
    for endpoint in &ctx.config.endpoints {
        ctx.output.list_item(endpoint);
    }

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    let (errors, warnings) = check(&ctx.config);

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Collect errors and warnings for a config.
fn check(config: &CliConfig) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if config.defaults.strategy.parse::<Strategy>().is_err() {
        warnings.push(format!(
            "defaults.strategy {:?} is not recognized; runs will use network",
            config.defaults.strategy
        ));
    }

    if config.defaults.cache_name.as_str().trim().is_empty() {
        errors.push("defaults.cache_name must not be empty".to_string());
    }

    if config.store.dir.trim().is_empty() {
        errors.push("store.dir must not be empty".to_string());
    }

    if config.endpoints.is_empty() {
        warnings.push("no endpoints configured; pass URLs to `fetchctl fetch`".to_string());
    }
    for (i, endpoint) in config.endpoints.iter().enumerate() {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(format!("endpoints[{}] must be an http(s) URL: {}", i, endpoint));
        }
    }

    let network = &config.network;
    if network.connect_timeout_ms == Some(0) {
        errors.push("network.connect_timeout_ms must be greater than 0".to_string());
    }
    if network.total_timeout_ms == Some(0) {
        errors.push("network.total_timeout_ms must be greater than 0".to_string());
    }
    if let (Some(connect), Some(total)) = (network.connect_timeout_ms, network.total_timeout_ms) {
        if connect > total {
            warnings.push(format!(
                "network.connect_timeout_ms ({}) exceeds total_timeout_ms ({})",
                connect, total
            ));
        }
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_clean() {
        let (errors, warnings) = check(&CliConfig::default());
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unknown_strategy_is_a_warning() {
        let mut config = CliConfig::default();
        config.defaults.strategy = "fastest".to_string();

        let (errors, warnings) = check(&config);
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_bad_endpoint_and_timeouts() {
        let mut config = CliConfig::default();
        config.endpoints = vec!["ftp://x".to_string()];
        config.network.connect_timeout_ms = Some(0);
        config.network.total_timeout_ms = Some(100);

        let (errors, _) = check(&config);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_connect_over_total_is_a_warning() {
        let mut config = CliConfig::default();
        config.network.connect_timeout_ms = Some(5000);
        config.network.total_timeout_ms = Some(1000);

        let (errors, warnings) = check(&config);
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            config: CliConfig::default(),
            config_path: None,
            output: crate::output::Output::new(false, true),
            cwd: dir.path().to_path_buf(),
        };

        init_config(false, &ctx).await.unwrap();
        assert!(init_config(false, &ctx).await.is_err());
        init_config(true, &ctx).await.unwrap();

        let written = CliConfig::load(dir.path().join("fetchctl.toml").to_str().unwrap()).unwrap();
        assert_eq!(written.endpoints.len(), 3);
    }
}
