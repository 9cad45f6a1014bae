//! Durable named caches for fetched responses.
//!
//! This crate provides:
//! - `CacheStore` / `CacheHandle` - The cache capability the strategies consume
//! - `CacheKey` - Entry identity derived from a request's canonical URL
//! - `MemoryCacheStore` - In-process store with operation counters
//! - `FileCacheStore` - Directory-backed store that survives restarts
//!
//! # Example
//!
//! ```ignore
//! use fetch_cache::{CacheStore, MemoryCacheStore};
//! use fetch_core::{CacheName, RequestDescriptor};
//!
//! let store = MemoryCacheStore::new();
//! let cache = store.open(&CacheName::new("todosAppCache")).await?;
//! let request = RequestDescriptor::new("https://jsonplaceholder.typicode.com/todos");
//!
//! if let Some(response) = cache.match_request(&request).await? {
//!     let todos = response.json()?;
//! }
//! ```

mod entry;
mod error;
mod file;
mod key;
mod memory;
mod store;

pub use entry::*;
pub use error::CacheError;
pub use file::FileCacheStore;
pub use key::CacheKey;
pub use memory::{CacheStats, MemoryCacheStore};
pub use store::{CacheHandle, CacheStore};
