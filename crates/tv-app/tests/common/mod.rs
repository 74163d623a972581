//! Shared wiring for the loader and session tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;

use tv_app::{
    CursorPaginator, GallerySession, IndexingStatusPoller, LoadOptions, ProgressiveLoader,
    RetryController,
};
use tv_core::ports::CacheStorePort;
use tv_core::settings::IndexingSettings;
use tv_core::{EntryStats, LoadMoreTrigger, Record, ViewKey};
use tv_infra::{InMemoryCacheStore, InMemoryProvider, ManualClock};

pub const CONTRACT: &str = "0xC0113C7";

static TRACE_INIT: Once = Once::new();

/// `RUST_LOG=tv_app=debug cargo test` shows the loader's spans.
pub fn init_tracing() {
    TRACE_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn view() -> ViewKey {
    ViewKey::new(CONTRACT, 1u64)
}

pub fn options(batch_size: u32, max_batches: u32) -> LoadOptions {
    LoadOptions {
        batch_size,
        max_batches,
        ..LoadOptions::default()
    }
}

pub struct Harness {
    pub provider: Arc<InMemoryProvider>,
    pub cache: Arc<InMemoryCacheStore>,
    pub clock: Arc<ManualClock>,
    pub loader: Arc<ProgressiveLoader>,
    pub poller: Arc<IndexingStatusPoller>,
}

impl Harness {
    pub fn new(provider: InMemoryProvider) -> Self {
        init_tracing();
        let provider = Arc::new(provider);
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let cache = Arc::new(InMemoryCacheStore::new(64, clock.clone()));
        let paginator = Arc::new(CursorPaginator::new(provider.clone()));
        let loader = Arc::new(ProgressiveLoader::new(
            cache.clone(),
            paginator,
            RetryController::default(),
        ));
        let poller = Arc::new(IndexingStatusPoller::new(provider.clone()));
        Self {
            provider,
            cache,
            clock,
            loader,
            poller,
        }
    }

    pub fn session(&self, options: LoadOptions) -> GallerySession {
        self.session_with_indexing(
            options,
            IndexingSettings {
                enabled: false,
                poll_interval_secs: 0,
            },
        )
    }

    pub fn session_with_indexing(
        &self,
        options: LoadOptions,
        indexing: IndexingSettings,
    ) -> GallerySession {
        GallerySession::new(
            self.loader.clone(),
            self.poller.clone(),
            self.cache.clone(),
            options,
            indexing,
            LoadMoreTrigger::new(3),
        )
    }

    pub async fn stats(&self, key: &ViewKey) -> EntryStats {
        self.cache.stats(key).await.unwrap_or_default()
    }

    pub async fn items(&self, key: &ViewKey) -> Vec<Record> {
        self.cache
            .peek(key)
            .await
            .map(|entry| entry.items)
            .unwrap_or_default()
    }
}

pub fn token_ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.token_id.clone()).collect()
}

pub fn expected_ids(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    range.map(|n| n.to_string()).collect()
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
