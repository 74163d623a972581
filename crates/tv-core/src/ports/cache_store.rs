use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{ApplyOutcome, CacheEntry, Continuation, EntryStats};
use crate::page::PageResult;
use crate::record::Record;
use crate::view::ViewKey;

/// Store of cached view results, shared by every loader.
///
/// The store is the only shared mutable resource of the loading pipeline.
/// All generation-tagged writes go through it, so a write from a superseded
/// generation is a no-op rather than a race.
/// 所有带代号的写入都经过此存储，过期代号的写入不会生效。
#[async_trait]
pub trait CacheStorePort: Send + Sync {
    /// Fresh entry (completed and younger than `ttl`), or `None`.
    async fn get(&self, key: &ViewKey, ttl: Duration) -> Option<CacheEntry>;

    /// Entry of any age, for serving stale data when a refetch fails.
    async fn peek(&self, key: &ViewKey) -> Option<CacheEntry>;

    /// Overwrites the entry for `key`.
    async fn put(&self, key: &ViewKey, entry: CacheEntry);

    /// Removes the entry so the next lookup is a cold miss.
    async fn invalidate(&self, key: &ViewKey);

    async fn invalidate_all(&self);

    /// Allocates a new generation for `key` and restarts its entry, creating
    /// it when missing. `placeholders` is applied only if the entry has no
    /// items to show.
    async fn begin_generation(&self, key: &ViewKey, placeholders: usize) -> u64;

    /// Allocates a new generation that continues from the entry's cursor.
    /// `None` when there is no entry or its sequence is exhausted.
    async fn continue_generation(&self, key: &ViewKey) -> Option<Continuation>;

    async fn apply_batch(
        &self,
        key: &ViewKey,
        generation: u64,
        batch_index: u32,
        page: PageResult,
    ) -> ApplyOutcome;

    /// Marks `generation`'s fetch as finished. Returns false when stale.
    async fn finish_generation(&self, key: &ViewKey, generation: u64, complete: bool) -> bool;

    /// Marks `generation`'s load as completed and stamps its freshness.
    async fn mark_complete(&self, key: &ViewKey, generation: u64) -> bool {
        self.finish_generation(key, generation, true).await
    }

    async fn current_generation(&self, key: &ViewKey) -> Option<u64>;

    async fn stats(&self, key: &ViewKey) -> Option<EntryStats>;

    /// Loaded items in `range` (clipped to what is loaded).
    async fn read_range(&self, key: &ViewKey, range: Range<usize>) -> Vec<Record>;
}
