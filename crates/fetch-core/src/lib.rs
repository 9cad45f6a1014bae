//! Core abstractions for cache/network fetch orchestration.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `RequestDescriptor` - Identity of an outbound fetch
//! - `CacheName` - Name of a durable key-value cache
//! - `Provenance` / `Payload` - What was reported and where it came from
//! - `RunPhase` - Per-run resolution state machine
//! - `FetchConfig` - Configuration surface consumed by the orchestrator

mod config;
mod lifecycle;
mod provenance;
mod request;

pub use config::*;
pub use lifecycle::*;
pub use provenance::*;
pub use request::*;
