//! In-memory view cache with bounded size.
//! 具备容量上限的内存视图缓存。

use std::collections::{HashMap, VecDeque};
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use tv_core::cache::{ApplyOutcome, CacheEntry, Continuation, EntryStats};
use tv_core::ports::{CacheStorePort, ClockPort};
use tv_core::{PageResult, Record, ViewKey};

/// Bounded LRU cache of view results.
/// 视图结果的有界 LRU 缓存。
///
/// Generations come from one store-wide counter, so a number handed out for
/// a key is never reused, even after the key is invalidated and re-created.
pub struct InMemoryCacheStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn ClockPort>,
}

struct Inner {
    entries: HashMap<ViewKey, CacheEntry>,
    /// Least recently used first.
    queue: VecDeque<ViewKey>,
    max_entries: usize,
    last_generation: u64,
}

impl InMemoryCacheStore {
    /// Create a new store holding at most `max_entries` views.
    /// 创建最多保存 `max_entries` 个视图的缓存。
    pub fn new(max_entries: usize, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                queue: VecDeque::new(),
                max_entries: max_entries.max(1),
                last_generation: 0,
            }),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, key: &ViewKey) -> bool {
        self.inner.lock().await.entries.contains_key(key)
    }
}

#[async_trait]
impl CacheStorePort for InMemoryCacheStore {
    async fn get(&self, key: &ViewKey, ttl: Duration) -> Option<CacheEntry> {
        let now_ms = self.clock.now_ms();
        let mut inner = self.inner.lock().await;
        let fresh = inner.entries.get(key)?.is_fresh(now_ms, ttl);
        if !fresh {
            return None;
        }
        inner.touch(key);
        inner.entries.get(key).cloned()
    }

    async fn peek(&self, key: &ViewKey) -> Option<CacheEntry> {
        let mut inner = self.inner.lock().await;
        let entry = inner.entries.get(key).cloned()?;
        inner.touch(key);
        Some(entry)
    }

    async fn put(&self, key: &ViewKey, entry: CacheEntry) {
        let mut inner = self.inner.lock().await;
        inner.last_generation = inner.last_generation.max(entry.generation);
        inner.entries.insert(key.clone(), entry);
        inner.touch(key);
        inner.evict_if_needed();
    }

    async fn invalidate(&self, key: &ViewKey) {
        let mut inner = self.inner.lock().await;
        if inner.entries.remove(key).is_some() {
            debug!(view = %key, "cache entry invalidated");
        }
        inner.queue.retain(|k| k != key);
    }

    async fn invalidate_all(&self) {
        let mut inner = self.inner.lock().await;
        let dropped = inner.entries.len();
        inner.entries.clear();
        inner.queue.clear();
        debug!(dropped, "cache cleared");
    }

    async fn begin_generation(&self, key: &ViewKey, placeholders: usize) -> u64 {
        let mut inner = self.inner.lock().await;
        let generation = inner.next_generation();
        inner
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(key.clone()))
            .restart(generation, placeholders);
        inner.touch(key);
        inner.evict_if_needed();
        debug!(view = %key, generation, "generation started");
        generation
    }

    async fn continue_generation(&self, key: &ViewKey) -> Option<Continuation> {
        let mut inner = self.inner.lock().await;
        let resumable = inner
            .entries
            .get(key)
            .map(|entry| !entry.in_flight && entry.has_next_page())
            .unwrap_or(false);
        if !resumable {
            return None;
        }
        let generation = inner.next_generation();
        let continuation = inner.entries.get_mut(key)?.resume(generation);
        inner.touch(key);
        continuation
    }

    async fn apply_batch(
        &self,
        key: &ViewKey,
        generation: u64,
        batch_index: u32,
        page: PageResult,
    ) -> ApplyOutcome {
        let mut inner = self.inner.lock().await;
        let Some(entry) = inner.entries.get_mut(key) else {
            return ApplyOutcome::Stale;
        };
        let outcome = entry.apply_page(generation, batch_index, page);
        if outcome == ApplyOutcome::Stale {
            debug!(view = %key, generation, live = entry.generation, "dropped stale batch");
        }
        outcome
    }

    async fn finish_generation(&self, key: &ViewKey, generation: u64, complete: bool) -> bool {
        let now_ms = self.clock.now_ms();
        let mut inner = self.inner.lock().await;
        inner
            .entries
            .get_mut(key)
            .map(|entry| entry.finish(generation, complete, now_ms))
            .unwrap_or(false)
    }

    async fn current_generation(&self, key: &ViewKey) -> Option<u64> {
        let inner = self.inner.lock().await;
        inner.entries.get(key).map(|entry| entry.generation)
    }

    async fn stats(&self, key: &ViewKey) -> Option<EntryStats> {
        let inner = self.inner.lock().await;
        inner.entries.get(key).map(CacheEntry::stats)
    }

    async fn read_range(&self, key: &ViewKey, range: Range<usize>) -> Vec<Record> {
        let inner = self.inner.lock().await;
        let Some(entry) = inner.entries.get(key) else {
            return Vec::new();
        };
        let end = range.end.min(entry.items.len());
        let start = range.start.min(end);
        entry.items[start..end].to_vec()
    }
}

impl Inner {
    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    fn touch(&mut self, key: &ViewKey) {
        self.queue.retain(|k| k != key);
        self.queue.push_back(key.clone());
    }

    fn evict_if_needed(&mut self) {
        while self.entries.len() > self.max_entries {
            if let Some(evicted) = self.pop_oldest_idle() {
                debug!(view = %evicted, "evicted idle cache entry");
                self.entries.remove(&evicted);
                continue;
            }
            if let Some(evicted) = self.queue.pop_front() {
                debug!(view = %evicted, "evicted loading cache entry");
                self.entries.remove(&evicted);
            } else {
                break;
            }
        }
    }

    fn pop_oldest_idle(&mut self) -> Option<ViewKey> {
        let pos = self.queue.iter().position(|key| {
            self.entries
                .get(key)
                .map(|entry| !entry.in_flight)
                .unwrap_or(false)
        })?;
        self.queue.remove(pos)
    }
}
