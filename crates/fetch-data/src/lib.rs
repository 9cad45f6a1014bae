//! Network fetch layer.
//!
//! This crate provides:
//! - `Response` - Fetched response with clone-before-consume body semantics
//! - `Fetcher` - The network capability the strategies consume
//! - `HttpFetcher` - reqwest-backed fetcher with timeouts
//! - `StubFetcher` - Scripted fetcher for tests and offline runs
//! - `TimeoutConfig` - Connect/total deadlines

mod client;
mod error;
mod fetcher;
mod response;
mod stub;
mod timeout;

pub use client::HttpFetcher;
pub use error::FetchError;
pub use fetcher::Fetcher;
pub use response::Response;
pub use stub::{StubFetcher, StubOutcome};
pub use timeout::TimeoutConfig;
