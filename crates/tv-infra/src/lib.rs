//! # tv-infra
//!
//! Adapters behind the `tv-core` ports: the bounded in-memory cache store,
//! wall-clock sources, and the upstream collection providers (HTTP and
//! in-memory).

pub mod cache;
pub mod provider;
pub mod time;

pub use cache::InMemoryCacheStore;
pub use provider::{HttpCollectionProvider, InMemoryProvider};
pub use time::{ManualClock, SystemClock};
