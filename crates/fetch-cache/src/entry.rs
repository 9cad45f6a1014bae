//! Stored cache entries.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use fetch_core::RequestDescriptor;
use fetch_data::Response;
use serde::{Deserialize, Serialize};

use crate::{CacheError, CacheKey};

/// A response as held by a cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEntry {
    /// Key the entry is stored under.
    pub key: CacheKey,
    /// HTTP status of the stored response.
    pub status: u16,
    /// Stored response headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Base64-encoded body.
    pub body: String,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl CachedEntry {
    /// Capture a response for storage. Takes the response by value: pass a
    /// clone if the body is still needed.
    pub fn capture(request: &RequestDescriptor, response: Response) -> Self {
        let status = response.status;
        let headers = response.headers.clone();
        let body = STANDARD.encode(response.into_bytes());

        Self {
            key: CacheKey::for_request(request),
            status,
            headers,
            body,
            stored_at: Utc::now(),
        }
    }

    /// Rebuild a fresh response from the entry.
    pub fn to_response(&self) -> Result<Response, CacheError> {
        let body = STANDARD
            .decode(&self.body)
            .map_err(|e| CacheError::Corrupt(format!("{}: {}", self.key, e)))?;

        Ok(Response::new(self.status, self.headers.clone(), body).with_url(self.key.as_str()))
    }

    /// Summary of the entry for listings.
    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            url: self.key.as_str().to_string(),
            status: self.status,
            size: self.body.len() * 3 / 4,
            stored_at: self.stored_at,
        }
    }
}

/// Listing view of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    /// Canonical URL of the stored request.
    pub url: String,
    /// HTTP status of the stored response.
    pub status: u16,
    /// Approximate body size in bytes.
    pub size: usize,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}
