//! Request descriptors and cache names.

use std::collections::BTreeMap;
use std::fmt;

use http::Method;
use serde::{Deserialize, Serialize};

/// Cache name used when none is configured.
pub const DEFAULT_CACHE_NAME: &str = "todosAppCache";

/// Identity of an outbound fetch.
///
/// Either a bare URL or a richer request carrying a method, headers and
/// free-form metadata. Two descriptors are cache-equivalent when their
/// canonical URLs match; headers and metadata do not take part in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RequestRepr", into = "RequestRepr")]
pub struct RequestDescriptor {
    url: String,
    method: Method,
    headers: BTreeMap<String, String>,
    metadata: BTreeMap<String, String>,
}

impl RequestDescriptor {
    /// Create a GET request for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a metadata entry. Metadata never leaves the process.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The URL as supplied.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request headers.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Metadata entry by key.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    /// Whether this is a plain URL request (GET, no headers, no metadata).
    pub fn is_plain(&self) -> bool {
        self.method == Method::GET && self.headers.is_empty() && self.metadata.is_empty()
    }

    /// Canonical form of the URL, used as cache identity.
    pub fn canonical_url(&self) -> String {
        canonicalize_url(&self.url)
    }

    /// Check if two descriptors address the same cache entry.
    pub fn is_cache_equivalent(&self, other: &RequestDescriptor) -> bool {
        self.canonical_url() == other.canonical_url()
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl From<&str> for RequestDescriptor {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for RequestDescriptor {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// Canonicalize a URL: trim whitespace, drop the fragment, lowercase the
/// scheme and authority, and give an empty path a leading `/`.
pub fn canonicalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let without_fragment = match trimmed.split_once('#') {
        Some((before, _)) => before,
        None => trimmed,
    };

    let Some((scheme, rest)) = without_fragment.split_once("://") else {
        return without_fragment.to_string();
    };

    let (authority, path) = match rest.find(|c| c == '/' || c == '?') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    format!(
        "{}://{}{}",
        scheme.to_ascii_lowercase(),
        authority.to_ascii_lowercase(),
        path
    )
}

/// Serialized form: a bare URL string or a request object.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RequestRepr {
    Url(String),
    Object {
        url: String,
        #[serde(default = "default_method", skip_serializing_if = "is_get")]
        method: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        metadata: BTreeMap<String, String>,
    },
}

fn default_method() -> String {
    "GET".to_string()
}

fn is_get(method: &String) -> bool {
    method.eq_ignore_ascii_case("GET")
}

impl From<RequestRepr> for RequestDescriptor {
    fn from(repr: RequestRepr) -> Self {
        match repr {
            RequestRepr::Url(url) => Self::new(url),
            RequestRepr::Object {
                url,
                method,
                headers,
                metadata,
            } => Self {
                url,
                // Unknown methods fall back to GET rather than failing the whole config.
                method: Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                    .unwrap_or(Method::GET),
                headers,
                metadata,
            },
        }
    }
}

impl From<RequestDescriptor> for RequestRepr {
    fn from(request: RequestDescriptor) -> Self {
        if request.is_plain() {
            return RequestRepr::Url(request.url);
        }
        RequestRepr::Object {
            url: request.url,
            method: request.method.as_str().to_string(),
            headers: request.headers,
            metadata: request.metadata,
        }
    }
}

/// Name of a logical, durable key-value cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheName(String);

impl CacheName {
    /// Create a cache name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CacheName {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_NAME)
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CacheName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CacheName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_url_lowercases_scheme_and_host() {
        assert_eq!(
            canonicalize_url("HTTPS://Example.COM/Todos"),
            "https://example.com/Todos"
        );
    }

    #[test]
    fn test_canonical_url_strips_fragment_and_whitespace() {
        assert_eq!(
            canonicalize_url("  https://x/todos#top \n"),
            "https://x/todos"
        );
    }

    #[test]
    fn test_canonical_url_empty_path() {
        assert_eq!(canonicalize_url("https://x"), "https://x/");
        assert_eq!(canonicalize_url("https://x?a=1"), "https://x/?a=1");
    }

    #[test]
    fn test_canonical_url_without_scheme_is_kept() {
        assert_eq!(canonicalize_url("/todos/1"), "/todos/1");
    }

    #[test]
    fn test_cache_equivalence_ignores_headers_and_metadata() {
        let plain = RequestDescriptor::new("https://x/todos");
        let rich = RequestDescriptor::new("HTTPS://X/todos")
            .with_header("Accept", "application/json")
            .with_metadata("component", "list");

        assert!(plain.is_cache_equivalent(&rich));
        assert_ne!(plain, rich);
    }

    #[test]
    fn test_cache_equivalence_differs_on_path() {
        let a = RequestDescriptor::new("https://x/todos");
        let b = RequestDescriptor::new("https://x/todos/1");
        assert!(!a.is_cache_equivalent(&b));
    }

    #[test]
    fn test_request_from_str() {
        let req: RequestDescriptor = "https://x/todos".into();
        assert_eq!(req.url(), "https://x/todos");
        assert_eq!(req.method(), &Method::GET);
        assert!(req.is_plain());
    }

    #[test]
    fn test_request_deserialize_string() {
        let req: RequestDescriptor = serde_json::from_str(r#""https://x/todos""#).unwrap();
        assert_eq!(req, RequestDescriptor::new("https://x/todos"));
    }

    #[test]
    fn test_request_deserialize_object() {
        let req: RequestDescriptor = serde_json::from_str(
            r#"{"url": "https://x/posts/1", "method": "head", "headers": {"Accept": "application/json"}}"#,
        )
        .unwrap();

        assert_eq!(req.url(), "https://x/posts/1");
        assert_eq!(req.method(), &Method::HEAD);
        assert_eq!(req.headers().get("Accept").map(String::as_str), Some("application/json"));
    }

    #[test]
    fn test_request_serialize_plain_as_string() {
        let json = serde_json::to_string(&RequestDescriptor::new("https://x/todos")).unwrap();
        assert_eq!(json, r#""https://x/todos""#);
    }

    #[test]
    fn test_request_metadata_lookup() {
        let req = RequestDescriptor::new("https://x").with_metadata("label", "todos");
        assert_eq!(req.metadata("label"), Some("todos"));
        assert_eq!(req.metadata("missing"), None);
        assert!(!req.is_plain());
    }

    #[test]
    fn test_cache_name_default() {
        assert_eq!(CacheName::default().as_str(), DEFAULT_CACHE_NAME);
    }

    #[test]
    fn test_cache_name_serialization() {
        let name = CacheName::new("c");
        assert_eq!(serde_json::to_string(&name).unwrap(), r#""c""#);
        assert_eq!(format!("{}", name), "c");
    }
}
