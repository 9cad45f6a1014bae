//! Durable cache inspection commands.

use std::collections::BTreeMap;

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use fetch_cache::{CacheStore, EntryInfo};
use fetch_core::{CacheName, RequestDescriptor};
use serde::Serialize;

use super::{CacheArgs, CacheCommand};
use crate::context::Context;
use crate::output::{format_bytes, truncate};

/// Run the cache command.
pub async fn run(args: CacheArgs, ctx: &Context) -> Result<()> {
    let store = ctx.cache_store();

    match args.command {
        CacheCommand::List { cache } => list_entries(&store, cache, ctx).await,
        CacheCommand::Show { url, cache } => show_entry(&store, &url, cache, ctx).await,
        CacheCommand::Delete { url, cache } => delete_entry(&store, &url, cache, ctx).await,
        CacheCommand::Clear { cache, yes } => clear_caches(&store, cache, yes, ctx).await,
    }
}

fn cache_name(cache: Option<String>, ctx: &Context) -> CacheName {
    cache
        .map(CacheName::new)
        .unwrap_or_else(|| ctx.config.defaults.cache_name.clone())
}

#[derive(Serialize)]
struct CacheListing {
    cache: CacheName,
    entries: Vec<EntryInfo>,
}

async fn list_entries(store: &dyn CacheStore, cache: Option<String>, ctx: &Context) -> Result<()> {
    let names = match cache {
        Some(name) => vec![CacheName::new(name)],
        None => store
            .cache_names()
            .await
            .context("Failed to list caches")?,
    };

    let mut listings = Vec::with_capacity(names.len());
    for name in names {
        let handle = store
            .open(&name)
            .await
            .with_context(|| format!("Failed to open cache {}", name))?;
        let entries = handle
            .entries()
            .await
            .with_context(|| format!("Failed to list cache {}", name))?;
        listings.push(CacheListing {
            cache: name,
            entries,
        });
    }

    if ctx.output.is_json() {
        ctx.output.json(&listings);
        return Ok(());
    }

    if listings.is_empty() {
        ctx.output.info("No caches found.");
        ctx.output.info("Run `fetchctl fetch` to populate one.");
        return Ok(());
    }

    let widths = [50, 6, 10, 20];
    for listing in &listings {
        ctx.output.header(&format!("Cache {}", listing.cache));
        if listing.entries.is_empty() {
            ctx.output.info("(empty)");
            continue;
        }

        ctx.output.table_row(&["URL", "STATUS", "SIZE", "STORED"], &widths);
        for entry in &listing.entries {
            let url = truncate(&entry.url, 50);
            let status = entry.status.to_string();
            let size = format_bytes(entry.size as u64);
            let stored = entry.stored_at.format("%Y-%m-%d %H:%M:%S").to_string();
            ctx.output.table_row(&[&url, &status, &size, &stored], &widths);
        }
        ctx.output
            .info(&format!("Total: {} entr(ies)", listing.entries.len()));
    }

    Ok(())
}

#[derive(Serialize)]
struct EntryView {
    url: String,
    cache: CacheName,
    status: u16,
    headers: BTreeMap<String, String>,
    payload: serde_json::Value,
}

async fn show_entry(
    store: &dyn CacheStore,
    url: &str,
    cache: Option<String>,
    ctx: &Context,
) -> Result<()> {
    let name = cache_name(cache, ctx);
    let request = RequestDescriptor::new(url);

    let handle = store
        .open(&name)
        .await
        .with_context(|| format!("Failed to open cache {}", name))?;
    let Some(response) = handle.match_request(&request).await? else {
        bail!("No entry for {} in cache {}", url, name);
    };

    let status = response.status;
    let headers = response.headers.clone();
    let payload = match response.clone().json() {
        Ok(value) => value,
        Err(_) => serde_json::Value::String(response.text().unwrap_or_default()),
    };

    let view = EntryView {
        url: request.canonical_url(),
        cache: name,
        status,
        headers,
        payload,
    };

    if ctx.output.is_json() {
        ctx.output.json(&view);
        return Ok(());
    }

    ctx.output.header(&view.url);
    ctx.output.kv("cache", view.cache.as_str());
    ctx.output.kv("status", &view.status.to_string());
    for (key, value) in &view.headers {
        ctx.output.kv(key, value);
    }
    println!("{}", serde_json::to_string_pretty(&view.payload)?);

    Ok(())
}

async fn delete_entry(
    store: &dyn CacheStore,
    url: &str,
    cache: Option<String>,
    ctx: &Context,
) -> Result<()> {
    let name = cache_name(cache, ctx);
    let handle = store
        .open(&name)
        .await
        .with_context(|| format!("Failed to open cache {}", name))?;

    if handle.delete(&RequestDescriptor::new(url)).await? {
        ctx.output.success(&format!("Deleted {} from {}", url, name));
    } else {
        ctx.output.warn(&format!("No entry for {} in cache {}", url, name));
    }

    Ok(())
}

async fn clear_caches(
    store: &dyn CacheStore,
    cache: Option<String>,
    yes: bool,
    ctx: &Context,
) -> Result<()> {
    let targets = match cache {
        Some(name) => vec![CacheName::new(name)],
        None => store.cache_names().await.context("Failed to list caches")?,
    };

    if targets.is_empty() {
        ctx.output.info("Nothing to clear.");
        return Ok(());
    }

    if !yes {
        if ctx.output.is_json() {
            bail!("Refusing to clear caches without --yes in JSON mode");
        }
        let names: Vec<&str> = targets.iter().map(CacheName::as_str).collect();
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete cache(s) {}?", names.join(", ")))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Clear cancelled");
            return Ok(());
        }
    }

    for name in &targets {
        if store.delete_cache(name).await? {
            ctx.output.success(&format!("Cleared {}", name));
        } else {
            ctx.output.warn(&format!("Cache {} does not exist", name));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use crate::output::Output;
    use fetch_cache::FileCacheStore;
    use fetch_data::Response;
    use serde_json::json;

    fn json_ctx(dir: &std::path::Path) -> Context {
        let mut config = CliConfig::default();
        config.store.dir = dir.to_string_lossy().to_string();
        Context {
            config,
            config_path: None,
            output: Output::new(false, true),
            cwd: dir.to_path_buf(),
        }
    }

    async fn seeded_store(dir: &std::path::Path) -> FileCacheStore {
        let store = FileCacheStore::new(dir);
        let cache = store.open(&CacheName::default()).await.unwrap();
        cache
            .put(
                &RequestDescriptor::new("https://x/todos"),
                Response::json_body(200, &json!([{"id": 1}])).unwrap(),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_show_missing_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = json_ctx(dir.path());
        let store = seeded_store(dir.path()).await;

        let err = show_entry(&store, "https://x/posts/1", None, &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No entry"));
        show_entry(&store, "https://x/todos", None, &ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = json_ctx(dir.path());
        let store = seeded_store(dir.path()).await;

        delete_entry(&store, "https://x/todos", None, &ctx).await.unwrap();

        let cache = store.open(&CacheName::default()).await.unwrap();
        assert!(cache.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_requires_yes_in_json_mode() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = json_ctx(dir.path());
        let store = seeded_store(dir.path()).await;

        assert!(clear_caches(&store, None, false, &ctx).await.is_err());
        clear_caches(&store, None, true, &ctx).await.unwrap();
        assert!(store.cache_names().await.unwrap().is_empty());
    }
}
