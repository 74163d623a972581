//! Cached result set of one view and the rules for mutating it.
//! 单个视图的缓存结果集及其变更规则。
//!
//! The store implementation only decides *where* entries live. Every rule
//! about *how* an entry changes (generation checks, batch ordering, item
//! replacement, total clamping) lives here so it can be tested without any
//! store.

use std::time::Duration;

use serde::Serialize;

use crate::page::{Cursor, PageResult};
use crate::record::Record;
use crate::view::ViewKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: ViewKey,
    /// Upstream order; never reordered in place.
    pub items: Vec<Record>,
    /// Always `>= items.len()`.
    pub total_count: u64,
    pub next_cursor: Option<Cursor>,
    /// When the last load of this entry completed. `0` if it never did.
    pub fetched_at_ms: i64,
    /// Only writes carrying this generation are applied.
    pub generation: u64,
    /// Synthetic slots shown after `items` until the first real batch lands.
    pub placeholders: usize,
    /// Index of the next batch this generation expects.
    pub batches_applied: u32,
    pub complete: bool,
    pub in_flight: bool,
}

/// Result of offering a batch to an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { loaded: usize, total: u64 },
    /// The writer's generation is no longer live (or the entry is gone).
    Stale,
    /// The batch arrived ahead of its predecessors.
    OutOfOrder { expected: u32 },
}

/// Where a page-at-a-time fetch picks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    pub generation: u64,
    pub next_batch: u32,
    pub cursor: Cursor,
}

/// Cheap summary of an entry, used by the render path instead of cloning items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EntryStats {
    pub loaded: usize,
    pub total_count: u64,
    pub placeholders: usize,
    pub has_next_page: bool,
    pub in_flight: bool,
    pub complete: bool,
    pub generation: u64,
}

impl EntryStats {
    /// Number of slots the list should report: loaded items, then
    /// placeholders, stretched to the upstream total while more pages exist.
    pub fn display_count(&self) -> usize {
        let shown = self.loaded + self.placeholders;
        if self.has_next_page {
            let total = usize::try_from(self.total_count).unwrap_or(usize::MAX);
            shown.max(total)
        } else {
            shown
        }
    }
}

impl CacheEntry {
    pub fn new(key: ViewKey) -> Self {
        Self {
            key,
            items: Vec::new(),
            total_count: 0,
            next_cursor: None,
            fetched_at_ms: 0,
            generation: 0,
            placeholders: 0,
            batches_applied: 0,
            complete: false,
            in_flight: false,
        }
    }

    /// A hit requires a completed load younger than `ttl`.
    pub fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        if !self.complete {
            return false;
        }
        let age_ms = now_ms.saturating_sub(self.fetched_at_ms);
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        age_ms < ttl_ms
    }

    pub fn has_next_page(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Starts a fresh fetch under `generation`.
    ///
    /// Existing items stay visible until the first batch of the new
    /// generation replaces them; placeholders are only installed when there
    /// is nothing else to show.
    pub fn restart(&mut self, generation: u64, placeholders: usize) {
        self.generation = generation;
        self.batches_applied = 0;
        self.complete = false;
        self.in_flight = true;
        self.placeholders = if self.items.is_empty() { placeholders } else { 0 };
    }

    /// Continues the current sequence under `generation`, or returns `None`
    /// when the sequence is exhausted.
    pub fn resume(&mut self, generation: u64) -> Option<Continuation> {
        let cursor = self.next_cursor.clone()?;
        self.generation = generation;
        self.in_flight = true;
        Some(Continuation {
            generation,
            next_batch: self.batches_applied,
            cursor,
        })
    }

    pub fn apply_page(&mut self, generation: u64, batch_index: u32, page: PageResult) -> ApplyOutcome {
        if generation != self.generation {
            return ApplyOutcome::Stale;
        }
        if batch_index != self.batches_applied {
            return ApplyOutcome::OutOfOrder {
                expected: self.batches_applied,
            };
        }

        // A later empty page says nothing about the total; keep what the
        // earlier pages of this sequence advertised.
        let keeps_total = batch_index > 0 && page.items.is_empty();
        if batch_index == 0 {
            self.items = page.items;
        } else {
            self.items.extend(page.items);
        }
        self.placeholders = 0;
        let advertised = if keeps_total {
            self.total_count
        } else {
            page.total_count
        };
        // Upstream may still be indexing and under-report its total.
        self.total_count = advertised.max(self.items.len() as u64);
        self.next_cursor = page.next_cursor;
        self.batches_applied += 1;

        ApplyOutcome::Applied {
            loaded: self.items.len(),
            total: self.total_count,
        }
    }

    /// Ends `generation`'s fetch. Returns false for a stale generation.
    pub fn finish(&mut self, generation: u64, complete: bool, now_ms: i64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.in_flight = false;
        if complete {
            self.complete = true;
            self.fetched_at_ms = now_ms;
        }
        true
    }

    pub fn stats(&self) -> EntryStats {
        EntryStats {
            loaded: self.items.len(),
            total_count: self.total_count,
            placeholders: self.placeholders,
            has_next_page: self.has_next_page(),
            in_flight: self.in_flight,
            complete: self.complete,
            generation: self.generation,
        }
    }
}
