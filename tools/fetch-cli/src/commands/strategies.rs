//! List the available strategies.

use anyhow::Result;
use console::style;
use fetch_strategy::Strategy;
use serde::Serialize;

use crate::context::Context;

#[derive(Serialize)]
struct StrategyInfo {
    id: &'static str,
    description: &'static str,
    uses_cache: bool,
    default: bool,
}

/// Run the strategies command.
pub async fn run(ctx: &Context) -> Result<()> {
    let configured = ctx.config.defaults.strategy.parse::<Strategy>().ok();

    let infos: Vec<StrategyInfo> = Strategy::ALL
        .iter()
        .map(|s| StrategyInfo {
            id: s.id(),
            description: s.description(),
            uses_cache: s.uses_cache(),
            default: configured == Some(*s),
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&infos);
        return Ok(());
    }

    ctx.output.header("Strategies");
    for info in &infos {
        let marker = if info.default {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        ctx.output
            .table_row(&[marker.as_str(), info.id, info.description], &[1, 24, 48]);
    }

    if configured.is_none() {
        ctx.output.warn(&format!(
            "Configured strategy {:?} is not recognized; runs will use network",
            ctx.config.defaults.strategy
        ));
    }

    Ok(())
}
