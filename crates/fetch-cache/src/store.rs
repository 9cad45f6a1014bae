//! The cache capability.

use std::sync::Arc;

use async_trait::async_trait;
use fetch_core::{CacheName, RequestDescriptor};
use fetch_data::Response;

use crate::{CacheError, EntryInfo};

/// A store of named caches.
///
/// Shared across concurrent runs and strategies. Writers to the same key
/// race with last-write-wins; no locking is done above the store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open (creating if needed) the cache with this name.
    async fn open(&self, name: &CacheName) -> Result<Arc<dyn CacheHandle>, CacheError>;

    /// Names of the caches that currently exist.
    async fn cache_names(&self) -> Result<Vec<CacheName>, CacheError>;

    /// Delete a whole cache. Returns whether it existed.
    async fn delete_cache(&self, name: &CacheName) -> Result<bool, CacheError>;
}

/// One opened cache.
#[async_trait]
pub trait CacheHandle: Send + Sync {
    /// Name of this cache.
    fn name(&self) -> &CacheName;

    /// Look up the stored response for a request. `Ok(None)` is a miss.
    async fn match_request(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Option<Response>, CacheError>;

    /// Store a response for a request, replacing any previous entry.
    async fn put(&self, request: &RequestDescriptor, response: Response) -> Result<(), CacheError>;

    /// Remove the entry for a request. Returns whether it existed.
    async fn delete(&self, request: &RequestDescriptor) -> Result<bool, CacheError>;

    /// List stored entries.
    async fn entries(&self) -> Result<Vec<EntryInfo>, CacheError>;
}

#[async_trait]
impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    async fn open(&self, name: &CacheName) -> Result<Arc<dyn CacheHandle>, CacheError> {
        (**self).open(name).await
    }

    async fn cache_names(&self) -> Result<Vec<CacheName>, CacheError> {
        (**self).cache_names().await
    }

    async fn delete_cache(&self, name: &CacheName) -> Result<bool, CacheError> {
        (**self).delete_cache(name).await
    }
}
