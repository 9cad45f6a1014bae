//! Fetched responses.

use std::collections::BTreeMap;

use fetch_core::Payload;
use serde::Serialize;

use crate::FetchError;

/// A response from the network or from a cache.
///
/// Reading the body (`json`, `text`, `into_bytes`) consumes the response.
/// Code that needs to both store and parse a response must `clone()` it
/// first and hand the clone to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response headers.
    pub headers: BTreeMap<String, String>,
    /// Final URL the response was served from.
    pub url: String,
    body: Vec<u8>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            url: String::new(),
            body,
        }
    }

    /// Create a response carrying a JSON body.
    pub fn json_body<T: Serialize>(status: u16, value: &T) -> Result<Self, FetchError> {
        let body = serde_json::to_vec(value)?;
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Ok(Self::new(status, headers, body))
    }

    /// Set the URL the response was served from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Check if the response was successful (2xx status).
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Body size in bytes.
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Consume the response and parse the body as JSON.
    pub fn json(self) -> Result<Payload, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    /// Consume the response and return the body as text.
    pub fn text(self) -> Result<String, FetchError> {
        String::from_utf8(self.body)
            .map_err(|e| FetchError::Parse(format!("Invalid UTF-8: {}", e)))
    }

    /// Consume the response and return the raw body.
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}
