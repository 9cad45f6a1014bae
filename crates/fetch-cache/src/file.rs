//! Directory-backed cache store.
//!
//! Layout: `<root>/<encoded cache name>/<key digest>.json`, one JSON
//! `CachedEntry` per file. Each write goes to its own temporary file and is
//! renamed into place, so a reader sees either the old entry or a complete
//! new one, and concurrent writers to one key settle on the last rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fetch_core::{CacheName, RequestDescriptor};
use fetch_data::Response;
use tokio::fs;

use crate::{CacheError, CacheHandle, CacheKey, CacheStore, CachedEntry, EntryInfo};

/// Cache store persisting entries under a root directory.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    root: PathBuf,
}

impl FileCacheStore {
    /// Create a store rooted at `root`. Nothing is created until a cache is opened.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, name: &CacheName) -> PathBuf {
        self.root.join(dir_name(name))
    }
}

/// Suffix source for temporary files, unique within the process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Map a cache name to a directory name.
///
/// `[A-Za-z0-9_-]` pass through; every other byte becomes `%XX`. The
/// mapping is injective and reversed by `parse_dir_name`. The empty name
/// maps to `%`, which no non-empty name produces.
fn dir_name(name: &CacheName) -> String {
    let raw = name.as_str();
    if raw.is_empty() {
        return "%".to_string();
    }

    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

/// Inverse of `dir_name`. `None` for directories this store would not create.
fn parse_dir_name(dir: &str) -> Option<CacheName> {
    if dir == "%" {
        return Some(CacheName::new(""));
    }

    let bytes = dir.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = dir.get(i + 1..i + 3)?;
                decoded.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-') => {
                decoded.push(b);
                i += 1;
            }
            _ => return None,
        }
    }
    let name = CacheName::new(String::from_utf8(decoded).ok()?);
    // Non-canonical spellings such as `%61` would open a different directory.
    (dir_name(&name) == dir).then_some(name)
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn open(&self, name: &CacheName) -> Result<Arc<dyn CacheHandle>, CacheError> {
        let dir = self.cache_dir(name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::Unavailable(format!("{}: {}", dir.display(), e)))?;

        let cache: Arc<dyn CacheHandle> = Arc::new(FileCache {
            name: name.clone(),
            dir,
        });
        Ok(cache)
    }

    async fn cache_names(&self) -> Result<Vec<CacheName>, CacheError> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            match entry.file_name().to_str().and_then(parse_dir_name) {
                Some(name) => names.push(name),
                None => {
                    tracing::debug!(dir = ?entry.file_name(), "Skipping foreign directory in cache root");
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete_cache(&self, name: &CacheName) -> Result<bool, CacheError> {
        match fs::remove_dir_all(self.cache_dir(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug)]
struct FileCache {
    name: CacheName,
    dir: PathBuf,
}

impl FileCache {
    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.digest()))
    }

    async fn read_entry(&self, path: &Path) -> Result<Option<CachedEntry>, CacheError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CacheHandle for FileCache {
    fn name(&self) -> &CacheName {
        &self.name
    }

    async fn match_request(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Option<Response>, CacheError> {
        let key = CacheKey::for_request(request);
        let Some(entry) = self.read_entry(&self.entry_path(&key)).await? else {
            return Ok(None);
        };

        // Digest collision: the file belongs to another URL.
        if entry.key != key {
            return Ok(None);
        }

        entry.to_response().map(Some)
    }

    async fn put(&self, request: &RequestDescriptor, response: Response) -> Result<(), CacheError> {
        let entry = CachedEntry::capture(request, response);
        let path = self.entry_path(&entry.key);
        let tmp = self.dir.join(format!(
            "{}.{}.{}.tmp",
            entry.key.digest(),
            std::process::id(),
            WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        let written = match fs::write(&tmp, serde_json::to_vec_pretty(&entry)?).await {
            Ok(()) => fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, request: &RequestDescriptor) -> Result<bool, CacheError> {
        let path = self.entry_path(&CacheKey::for_request(request));
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn entries(&self) -> Result<Vec<EntryInfo>, CacheError> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_entry(&path).await {
                Ok(Some(entry)) => entries.push(entry.info()),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable cache entry");
                }
            }
        }
        entries.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(entries)
    }
}
