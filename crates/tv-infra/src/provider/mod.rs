//! Upstream collection providers.
//! 上游集合数据提供者。

pub mod http;
mod in_memory;

pub use http::HttpCollectionProvider;
pub use in_memory::{sample_records, InMemoryProvider, ScriptedFailure};
