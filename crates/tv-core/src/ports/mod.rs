//! Port interfaces for the application layer
//!
//! Ports define the contract between the loading use cases and the
//! infrastructure that backs them (HTTP provider, in-memory cache, clock).
//! The use cases only ever see these traits, which keeps them testable with
//! scripted fakes and keeps the core free of I/O.
//!
//! ## Port Placement Guidelines
//!
//! A trait belongs here when:
//!
//! 1. it represents a capability the loader needs from the outside world,
//! 2. more than one use case depends on it, and
//! 3. it is implemented by the infrastructure layer.

mod cache_store;
mod clock;
mod collection_provider;
mod indexing;

pub use cache_store::CacheStorePort;
pub use clock::ClockPort;
pub use collection_provider::CollectionProviderPort;
pub use indexing::IndexingStatusPort;
