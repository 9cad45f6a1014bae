//! reqwest-backed network fetcher.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use fetch_core::RequestDescriptor;

use crate::{FetchError, Fetcher, Response, TimeoutConfig};

/// Fetcher that performs real HTTP requests.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeouts: TimeoutConfig,
}

impl HttpFetcher {
    /// Create a fetcher without deadlines.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeouts(TimeoutConfig::default())
    }

    /// Create a fetcher with connect/total deadlines.
    pub fn with_timeouts(timeouts: TimeoutConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(connect) = timeouts.connect {
            builder = builder.connect_timeout(connect);
        }
        if let Some(total) = timeouts.total {
            builder = builder.timeout(total);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(Self { client, timeouts })
    }

    /// Configured deadlines.
    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeouts.total.unwrap_or(Duration::ZERO))
        } else if error.is_connect() {
            FetchError::Connection(error.to_string())
        } else if error.is_builder() {
            FetchError::InvalidUrl(error.to_string())
        } else {
            FetchError::Request(error.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::debug!(url = %request, method = %request.method(), "Sending network request");

        let resp = builder.send().await.map_err(|e| self.classify(e))?;

        let status = resp.status().as_u16();
        let url = resp.url().to_string();
        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();
        let body = resp.bytes().await.map_err(|e| self.classify(e))?.to_vec();

        Ok(Response::new(status, headers, body).with_url(url))
    }
}
