//! Cache error types.

use thiserror::Error;

/// Errors that can occur when using a cache store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The store could not be opened or is switched off.
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    /// Failed to perform a store operation.
    #[error("Store operation failed: {0}")]
    Store(String),

    /// Failed to serialize or deserialize an entry.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry exists but cannot be decoded.
    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),
}
