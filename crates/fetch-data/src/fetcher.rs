//! The network capability.

use std::sync::Arc;

use async_trait::async_trait;
use fetch_core::RequestDescriptor;

use crate::{FetchError, Response};

/// Performs an outbound request.
///
/// A non-2xx status is still a successful fetch; only transport-level
/// problems are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the request.
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<Response, FetchError> {
        (**self).fetch(request).await
    }
}
