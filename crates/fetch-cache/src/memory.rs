//! In-process cache store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fetch_core::{CacheName, RequestDescriptor};
use fetch_data::Response;
use parking_lot::{Mutex, RwLock};

use crate::{CacheError, CacheHandle, CacheKey, CacheStore, CachedEntry, EntryInfo};

/// Snapshot of store operation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls to `open`.
    pub opens: usize,
    /// Calls to `match_request`.
    pub matches: usize,
    /// Calls to `put`.
    pub puts: usize,
    /// Calls to `delete`.
    pub deletes: usize,
}

impl CacheStats {
    /// Sum of all counted operations.
    pub fn total(&self) -> usize {
        self.opens + self.matches + self.puts + self.deletes
    }
}

#[derive(Debug, Default)]
struct Shared {
    opens: AtomicUsize,
    matches: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    unavailable: AtomicBool,
    read_latency: Mutex<Option<Duration>>,
}

impl Shared {
    fn check_available(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }
}

/// Cache store kept in memory.
///
/// Counts every operation and can be switched off or slowed down, so
/// callers can assert exactly how a strategy touched the cache.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    caches: RwLock<HashMap<CacheName, Arc<MemoryCache>>>,
    shared: Arc<Shared>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a response without counting it as an operation.
    pub fn seed(&self, name: &CacheName, request: &RequestDescriptor, response: Response) {
        let cache = self.cache(name);
        let entry = CachedEntry::capture(request, response);
        cache.entries.write().insert(entry.key.clone(), entry);
    }

    /// Check for an entry without counting it as an operation.
    pub fn contains(&self, name: &CacheName, request: &RequestDescriptor) -> bool {
        self.caches
            .read()
            .get(name)
            .map(|cache| cache.entries.read().contains_key(&CacheKey::for_request(request)))
            .unwrap_or(false)
    }

    /// Number of entries in a cache.
    pub fn len(&self, name: &CacheName) -> usize {
        self.caches
            .read()
            .get(name)
            .map(|cache| cache.entries.read().len())
            .unwrap_or(0)
    }

    /// Check if a cache has no entries.
    pub fn is_empty(&self, name: &CacheName) -> bool {
        self.len(name) == 0
    }

    /// Make every operation fail as unavailable (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.shared.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every lookup by `latency`.
    pub fn set_read_latency(&self, latency: Option<Duration>) {
        *self.shared.read_latency.lock() = latency;
    }

    /// Snapshot of the operation counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            opens: self.shared.opens.load(Ordering::SeqCst),
            matches: self.shared.matches.load(Ordering::SeqCst),
            puts: self.shared.puts.load(Ordering::SeqCst),
            deletes: self.shared.deletes.load(Ordering::SeqCst),
        }
    }

    fn cache(&self, name: &CacheName) -> Arc<MemoryCache> {
        self.caches
            .write()
            .entry(name.clone())
            .or_insert_with(|| {
                Arc::new(MemoryCache {
                    name: name.clone(),
                    entries: RwLock::new(HashMap::new()),
                    shared: Arc::clone(&self.shared),
                })
            })
            .clone()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn open(&self, name: &CacheName) -> Result<Arc<dyn CacheHandle>, CacheError> {
        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        self.shared.check_available()?;
        let cache: Arc<dyn CacheHandle> = self.cache(name);
        Ok(cache)
    }

    async fn cache_names(&self) -> Result<Vec<CacheName>, CacheError> {
        self.shared.check_available()?;
        let mut names: Vec<CacheName> = self.caches.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_cache(&self, name: &CacheName) -> Result<bool, CacheError> {
        self.shared.check_available()?;
        Ok(self.caches.write().remove(name).is_some())
    }
}

/// One cache inside a `MemoryCacheStore`.
#[derive(Debug)]
struct MemoryCache {
    name: CacheName,
    entries: RwLock<HashMap<CacheKey, CachedEntry>>,
    shared: Arc<Shared>,
}

#[async_trait]
impl CacheHandle for MemoryCache {
    fn name(&self) -> &CacheName {
        &self.name
    }

    async fn match_request(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Option<Response>, CacheError> {
        self.shared.matches.fetch_add(1, Ordering::SeqCst);
        let latency = *self.shared.read_latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.shared.check_available()?;

        let key = CacheKey::for_request(request);
        let entry = self.entries.read().get(&key).cloned();
        entry.map(|e| e.to_response()).transpose()
    }

    async fn put(&self, request: &RequestDescriptor, response: Response) -> Result<(), CacheError> {
        self.shared.puts.fetch_add(1, Ordering::SeqCst);
        self.shared.check_available()?;

        let entry = CachedEntry::capture(request, response);
        self.entries.write().insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn delete(&self, request: &RequestDescriptor) -> Result<bool, CacheError> {
        self.shared.deletes.fetch_add(1, Ordering::SeqCst);
        self.shared.check_available()?;

        Ok(self
            .entries
            .write()
            .remove(&CacheKey::for_request(request))
            .is_some())
    }

    async fn entries(&self) -> Result<Vec<EntryInfo>, CacheError> {
        self.shared.check_available()?;

        let mut entries: Vec<EntryInfo> = self.entries.read().values().map(|e| e.info()).collect();
        entries.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(entries)
    }
}
