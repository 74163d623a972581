//! View result caching.
//! 视图结果缓存。

mod in_memory_store;

pub use in_memory_store::InMemoryCacheStore;
