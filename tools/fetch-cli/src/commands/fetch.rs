//! Resolve endpoints through a caching strategy.

use std::sync::Arc;

use anyhow::{bail, Result};
use console::style;
use fetch_core::{CacheName, FetchConfig};
use fetch_strategy::{ChannelSink, Report, RunError, RunHandle, RunSummary, Strategy};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;

use super::FetchArgs;
use crate::context::Context;
use crate::output::{describe_payload, provenance_badge};

/// What one endpoint resolved to.
#[derive(Debug, Serialize)]
struct EndpointResult {
    url: String,
    strategy: Strategy,
    reports: Vec<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<RunSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl EndpointResult {
    async fn collect(url: String, handle: RunHandle, mut rx: UnboundedReceiver<Report>) -> Self {
        let strategy = handle.strategy();
        let outcome = handle.wait().await;

        let mut reports = Vec::new();
        while let Ok(report) = rx.try_recv() {
            reports.push(report);
        }

        let (summary, error) = split_outcome(outcome);
        Self {
            url,
            strategy,
            reports,
            summary,
            error,
        }
    }
}

fn split_outcome(outcome: Result<RunSummary, RunError>) -> (Option<RunSummary>, Option<String>) {
    match outcome {
        Ok(summary) => (Some(summary), None),
        Err(e) => (None, Some(e.to_string())),
    }
}

/// Run the fetch command.
pub async fn run(args: FetchArgs, ctx: &Context) -> Result<()> {
    let urls = if args.urls.is_empty() {
        ctx.config.endpoints.clone()
    } else {
        args.urls.clone()
    };
    if urls.is_empty() {
        bail!("No URLs given and no endpoints configured");
    }

    let strategy = args
        .strategy
        .clone()
        .unwrap_or_else(|| ctx.config.defaults.strategy.clone());
    let cache_name = args
        .cache_name
        .clone()
        .map(CacheName::new)
        .unwrap_or_else(|| ctx.config.defaults.cache_name.clone());

    let orchestrator = ctx.orchestrator()?;
    ctx.output.debug(&format!("Cache store: {}", ctx.store_dir().display()));

    let mut pending = Vec::with_capacity(urls.len());
    for url in &urls {
        let config = FetchConfig::new(url.as_str())
            .with_strategy(strategy.clone())
            .with_cache_name(cache_name.clone());
        let (sink, rx) = ChannelSink::new();
        let handle = orchestrator.slot(Arc::new(sink)).dispatch(&config);
        pending.push((url.clone(), handle, rx));
    }

    if let Some((_, handle, _)) = pending.first() {
        if let Some(diagnostic) = handle.diagnostic() {
            ctx.output.warn(&diagnostic.to_string());
        }
        ctx.output
            .header(&format!("{} ({} endpoint(s))", handle.strategy(), urls.len()));
    }

    let spinner = ctx.output.spinner("Resolving...");
    let results = join_all(
        pending
            .into_iter()
            .map(|(url, handle, rx)| EndpointResult::collect(url, handle, rx)),
    )
    .await;
    spinner.finish_and_clear();

    if ctx.output.is_json() {
        ctx.output.json(&results);
    } else {
        for result in &results {
            print_result(result, args.full, ctx);
        }
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        bail!("{} of {} endpoint(s) failed", failed, results.len());
    }

    Ok(())
}

fn print_result(result: &EndpointResult, full: bool, ctx: &Context) {
    ctx.output.info(&style(&result.url).bold().to_string());

    for report in &result.reports {
        ctx.output.list_item(&format!(
            "{} {}",
            provenance_badge(report.provenance),
            describe_payload(&report.payload)
        ));
    }

    if let Some(error) = &result.error {
        ctx.output.error(error);
    } else if result.reports.is_empty() {
        ctx.output.warn("No data: network and cache both unavailable");
    }

    if full {
        if let Some(last) = result.reports.last() {
            if let Ok(pretty) = serde_json::to_string_pretty(&last.payload) {
                println!("{}", pretty);
            }
        }
    }
}
