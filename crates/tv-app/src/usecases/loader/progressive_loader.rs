//! Fills a view's cache entry batch by batch.
//! 逐批填充视图的缓存条目。

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use tv_core::ports::CacheStorePort;
use tv_core::{ApplyOutcome, Cursor, LoadState, PageResult, TerminalError, ViewKey};

use super::handle::{LoadHandle, LoadOrigin};
use super::options::LoadOptions;
use super::sequencer::BatchSequencer;
use crate::usecases::paginator::{total_pages, CursorPaginator};
use crate::usecases::retry::{RetryController, RetryError};

/// Orchestrates page fetches into one growing, ordered cache entry per view.
///
/// At most one load runs per view. A second `load()` for a view that is
/// already loading joins the running one instead of starting a second
/// writer. Each load owns a cache generation; once a newer generation
/// exists, every write of the old one is rejected by the store.
///
/// 每个视图同时最多只有一个加载任务；重复调用会加入正在进行的加载。
pub struct ProgressiveLoader {
    cache: Arc<dyn CacheStorePort>,
    paginator: Arc<CursorPaginator>,
    retry: RetryController,
    views: Mutex<HashMap<ViewKey, ViewSlot>>,
    shutdown: CancellationToken,
}

struct ViewSlot {
    state: Arc<watch::Sender<LoadState>>,
    live: Option<LiveLoad>,
}

struct LiveLoad {
    generation: u64,
    cancel: CancellationToken,
}

impl ViewSlot {
    fn new() -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            state: Arc::new(state),
            live: None,
        }
    }

    fn handle(&self, key: ViewKey, origin: LoadOrigin, generation: Option<u64>) -> LoadHandle {
        LoadHandle::new(key, origin, generation, self.state.subscribe())
    }
}

struct Plan {
    start_batch: u32,
    cursor: Cursor,
    batch_limit: u32,
    prefetch: bool,
    /// Items this run can produce at most; caps the progress denominator.
    ceiling: u64,
    /// Total advertised before this run started, if it continues a sequence.
    known_total: u64,
}

enum RunOutcome {
    /// `fresh` is false when a substituted page left a gap in the entry.
    Completed { fresh: bool },
    Cancelled,
    Superseded,
    Failed(TerminalError),
}

impl ProgressiveLoader {
    pub fn new(
        cache: Arc<dyn CacheStorePort>,
        paginator: Arc<CursorPaginator>,
        retry: RetryController,
    ) -> Self {
        Self {
            cache,
            paginator,
            retry,
            views: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Starts (or joins, or satisfies from cache) the load of `key`.
    ///
    /// Returns once the view's state reflects the request: `Loaded` for a
    /// fresh cache hit, `Loading` otherwise, with placeholders already
    /// installed in the cache entry.
    pub async fn load(self: &Arc<Self>, key: ViewKey, options: LoadOptions) -> LoadHandle {
        let span = info_span!("usecase.progressive_loader.load", view = %key);

        async {
            let mut views = self.views.lock().await;
            let slot = views.entry(key.clone()).or_insert_with(ViewSlot::new);

            if let Some(live) = &slot.live {
                debug!(generation = live.generation, "joining in-flight load");
                return slot.handle(key.clone(), LoadOrigin::Joined, Some(live.generation));
            }

            if !options.bypass_cache {
                if let Some(entry) = self.cache.get(&key, options.ttl).await {
                    debug!(items = entry.items.len(), "fresh cache hit");
                    slot.state.send_replace(LoadState::Loaded);
                    return slot.handle(key.clone(), LoadOrigin::Cache, None);
                }
            }

            let generation = self
                .cache
                .begin_generation(&key, options.batch_size as usize)
                .await;
            let plan = Plan {
                start_batch: 0,
                cursor: self.paginator.first_cursor(),
                batch_limit: options.max_batches,
                prefetch: options.max_in_flight > 1
                    && self.paginator.paging_style().is_random_access(),
                ceiling: options.item_ceiling(),
                known_total: 0,
            };
            info!(
                generation,
                batch_size = options.batch_size,
                max_batches = options.max_batches,
                prefetch = plan.prefetch,
                "load started"
            );
            self.start(
                slot,
                key.clone(),
                generation,
                plan,
                options,
                LoadOrigin::Started,
                LoadState::Loading { progress: 0 },
            )
        }
        .instrument(span)
        .await
    }

    /// Fetches one more batch from the entry's continuation cursor.
    ///
    /// No-op (`None`) when the view is already loading, has no entry, or its
    /// sequence is exhausted.
    pub async fn load_next_batch(
        self: &Arc<Self>,
        key: &ViewKey,
        options: LoadOptions,
    ) -> Option<LoadHandle> {
        let mut views = self.views.lock().await;
        let slot = views.entry(key.clone()).or_insert_with(ViewSlot::new);
        if slot.live.is_some() {
            return None;
        }

        let continuation = self.cache.continue_generation(key).await?;
        let stats = self.cache.stats(key).await;
        let state = stats
            .as_ref()
            .map(|s| LoadState::loading(s.loaded, s.total_count))
            .unwrap_or(LoadState::Loading { progress: 0 });
        debug!(
            view = %key,
            generation = continuation.generation,
            batch = continuation.next_batch,
            "loading next batch"
        );

        let plan = Plan {
            start_batch: continuation.next_batch,
            cursor: continuation.cursor,
            batch_limit: 1,
            prefetch: false,
            ceiling: u64::MAX,
            known_total: stats.map(|s| s.total_count).unwrap_or(0),
        };
        Some(self.start(
            slot,
            key.clone(),
            continuation.generation,
            plan,
            options,
            LoadOrigin::Continued,
            state,
        ))
    }

    /// Cooperatively cancels the running load of `key`. Items already
    /// applied stay in the cache; the view goes back to `Idle`.
    pub async fn cancel(&self, key: &ViewKey) -> bool {
        let mut views = self.views.lock().await;
        let Some(slot) = views.get_mut(key) else {
            return false;
        };
        let Some(live) = slot.live.take() else {
            return false;
        };
        live.cancel.cancel();
        self.cache
            .finish_generation(key, live.generation, false)
            .await;
        slot.state.send_replace(LoadState::Idle);
        info!(view = %key, generation = live.generation, "load cancelled");
        true
    }

    /// Cancels every running load. Returns how many were cancelled.
    pub async fn cancel_all(&self) -> usize {
        let mut views = self.views.lock().await;
        let mut cancelled = 0;
        for (key, slot) in views.iter_mut() {
            if let Some(live) = slot.live.take() {
                live.cancel.cancel();
                self.cache
                    .finish_generation(key, live.generation, false)
                    .await;
                slot.state.send_replace(LoadState::Idle);
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            info!(cancelled, "all loads cancelled");
        }
        cancelled
    }

    /// Cancels everything, including loads started later.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub async fn state(&self, key: &ViewKey) -> LoadState {
        let views = self.views.lock().await;
        views
            .get(key)
            .map(|slot| slot.state.borrow().clone())
            .unwrap_or_default()
    }

    pub async fn subscribe(&self, key: &ViewKey) -> watch::Receiver<LoadState> {
        let mut views = self.views.lock().await;
        views
            .entry(key.clone())
            .or_insert_with(ViewSlot::new)
            .state
            .subscribe()
    }

    pub async fn is_loading(&self, key: &ViewKey) -> bool {
        let views = self.views.lock().await;
        views.get(key).map(|s| s.live.is_some()).unwrap_or(false)
    }

    #[allow(clippy::too_many_arguments)]
    fn start(
        self: &Arc<Self>,
        slot: &mut ViewSlot,
        key: ViewKey,
        generation: u64,
        plan: Plan,
        options: LoadOptions,
        origin: LoadOrigin,
        initial: LoadState,
    ) -> LoadHandle {
        let cancel = self.shutdown.child_token();
        slot.live = Some(LiveLoad {
            generation,
            cancel: cancel.clone(),
        });
        slot.state.send_replace(initial);
        let handle = slot.handle(key.clone(), origin, Some(generation));

        let state = Arc::clone(&slot.state);
        let this = Arc::clone(self);
        let span = info_span!("usecase.progressive_loader.drive", view = %key, generation);
        tokio::spawn(
            async move {
                this.drive(key, generation, plan, options, cancel, state)
                    .await
            }
            .instrument(span),
        );
        handle
    }

    async fn drive(
        self: Arc<Self>,
        key: ViewKey,
        generation: u64,
        plan: Plan,
        options: LoadOptions,
        cancel: CancellationToken,
        state: Arc<watch::Sender<LoadState>>,
    ) {
        let outcome = if plan.prefetch {
            self.run_prefetch(&key, generation, &plan, &options, &cancel, &state)
                .await
        } else {
            self.run_sequential(&key, generation, &plan, &options, &cancel, &state)
                .await
        };
        self.settle(&key, generation, outcome, &state).await;
    }

    async fn run_sequential(
        &self,
        key: &ViewKey,
        generation: u64,
        plan: &Plan,
        options: &LoadOptions,
        cancel: &CancellationToken,
        state: &watch::Sender<LoadState>,
    ) -> RunOutcome {
        let end = plan.start_batch.saturating_add(plan.batch_limit);
        let mut cursor = plan.cursor.clone();
        let mut batch = plan.start_batch;
        let mut known_total = plan.known_total;
        let mut fresh = true;

        while batch < end {
            let mut page = match self.fetch(key, &cursor, options.batch_size, cancel).await {
                Ok(page) => page,
                Err(RetryError::Cancelled) => return RunOutcome::Cancelled,
                Err(RetryError::Terminal(err)) => return RunOutcome::Failed(err),
            };
            if page.substituted {
                fresh = false;
                page.next_cursor = self.skip_past(batch, known_total, options.batch_size);
            } else {
                known_total = known_total.max(page.total_count);
            }
            let next = page.next_cursor.clone();
            if !self
                .apply(key, generation, batch, page, plan, options, state)
                .await
            {
                return RunOutcome::Superseded;
            }
            batch += 1;
            match next {
                Some(next) => cursor = next,
                None => return RunOutcome::Completed { fresh },
            }
        }
        RunOutcome::Completed { fresh }
    }

    /// Cursor of the batch after a substituted one, for page and offset
    /// providers whose advertised total extends past it.
    fn skip_past(&self, batch: u32, known_total: u64, page_size: u32) -> Option<Cursor> {
        let next = batch.checked_add(1)?;
        if u64::from(next) * u64::from(page_size) >= known_total {
            return None;
        }
        let cursor = self.paginator.cursor_for_batch(next, page_size)?;
        warn!(batch, next, known_total, "skipping past substituted batch");
        Some(cursor)
    }

    /// Page/offset providers: keep up to `max_in_flight` batches in flight
    /// and apply them strictly in batch order. Only the first batch goes out
    /// until a response has advertised a total.
    async fn run_prefetch(
        &self,
        key: &ViewKey,
        generation: u64,
        plan: &Plan,
        options: &LoadOptions,
        cancel: &CancellationToken,
        state: &watch::Sender<LoadState>,
    ) -> RunOutcome {
        let size = options.batch_size;
        let end = plan.start_batch.saturating_add(plan.batch_limit);
        let mut issue_limit = end.min(plan.start_batch.saturating_add(1));
        let mut known_pages = 0u32;
        let mut known_total = plan.known_total;
        let mut fresh = true;
        let mut next_issue = plan.start_batch;
        let mut sequencer = BatchSequencer::new(plan.start_batch);
        let mut pending = FuturesUnordered::new();

        loop {
            while pending.len() < options.max_in_flight && next_issue < issue_limit {
                let Some(cursor) = self.paginator.cursor_for_batch(next_issue, size) else {
                    break;
                };
                let index = next_issue;
                pending.push(async move {
                    let result = self.fetch(key, &cursor, size, cancel).await;
                    (index, result)
                });
                next_issue += 1;
            }

            let Some((index, result)) = pending.next().await else {
                return RunOutcome::Completed { fresh };
            };
            let page = match result {
                Ok(page) => page,
                Err(RetryError::Cancelled) => return RunOutcome::Cancelled,
                Err(RetryError::Terminal(err)) => return RunOutcome::Failed(err),
            };

            // Stop issuing batches past the largest advertised end; an
            // upstream that is still indexing may grow between pages.
            known_total = known_total.max(page.total_count);
            let pages = u32::try_from(total_pages(page.total_count, size)).unwrap_or(u32::MAX);
            known_pages = known_pages.max(pages);
            issue_limit = end.min(known_pages.max(plan.start_batch + 1));

            if index != sequencer.next_index() {
                debug!(batch = index, waiting_for = sequencer.next_index(), "parking early batch");
            }
            sequencer.insert(index, page);
            while let Some((index, mut page)) = sequencer.pop_ready() {
                if page.substituted {
                    fresh = false;
                    page.next_cursor = self.skip_past(index, known_total, size);
                }
                let last = page.is_last();
                if !self
                    .apply(key, generation, index, page, plan, options, state)
                    .await
                {
                    return RunOutcome::Superseded;
                }
                if last {
                    return RunOutcome::Completed { fresh };
                }
            }
        }
    }

    async fn fetch(
        &self,
        key: &ViewKey,
        cursor: &Cursor,
        page_size: u32,
        cancel: &CancellationToken,
    ) -> Result<PageResult, RetryError> {
        let paginator: &CursorPaginator = &self.paginator;
        self.retry
            .execute(cancel, move |attempt| {
                debug!(attempt, position = ?cursor.position(), "fetching batch");
                paginator.fetch_page(key, cursor, page_size)
            })
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply(
        &self,
        key: &ViewKey,
        generation: u64,
        batch: u32,
        page: PageResult,
        plan: &Plan,
        options: &LoadOptions,
        state: &watch::Sender<LoadState>,
    ) -> bool {
        match self.cache.apply_batch(key, generation, batch, page).await {
            ApplyOutcome::Applied { loaded, total } => {
                state.send_replace(LoadState::loading(loaded, total.min(plan.ceiling)));
                if let Some(on_progress) = &options.on_progress {
                    on_progress(loaded, total);
                }
                debug!(batch, loaded, total, "batch applied");
                true
            }
            ApplyOutcome::Stale => {
                debug!(batch, "generation superseded, dropping batch");
                false
            }
            ApplyOutcome::OutOfOrder { expected } => {
                warn!(batch, expected, "batch arrived out of order");
                false
            }
        }
    }

    async fn settle(
        &self,
        key: &ViewKey,
        generation: u64,
        outcome: RunOutcome,
        state: &watch::Sender<LoadState>,
    ) {
        let mut views = self.views.lock().await;
        let owns_view = views
            .get(key)
            .and_then(|slot| slot.live.as_ref())
            .map(|live| live.generation == generation)
            .unwrap_or(false);

        match outcome {
            RunOutcome::Completed { fresh: true } => {
                if self.cache.mark_complete(key, generation).await {
                    let loaded = self.cache.stats(key).await.map(|s| s.loaded).unwrap_or(0);
                    info!(loaded, "load completed");
                    state.send_replace(LoadState::Loaded);
                }
            }
            RunOutcome::Completed { fresh: false } => {
                // Shown, but never served from cache: the next load refetches.
                if self
                    .cache
                    .finish_generation(key, generation, false)
                    .await
                {
                    let loaded = self.cache.stats(key).await.map(|s| s.loaded).unwrap_or(0);
                    warn!(loaded, "load completed with substituted pages");
                    state.send_replace(LoadState::Loaded);
                }
            }
            RunOutcome::Failed(err) => {
                if self
                    .cache
                    .finish_generation(key, generation, false)
                    .await
                {
                    error!(attempts = err.attempts, reason = %err.reason, "load failed");
                    state.send_replace(LoadState::Failed {
                        reason: err.reason,
                        attempts: err.attempts,
                    });
                }
            }
            RunOutcome::Cancelled => {
                if self
                    .cache
                    .finish_generation(key, generation, false)
                    .await
                {
                    state.send_replace(LoadState::Idle);
                }
                debug!("load cancelled");
            }
            RunOutcome::Superseded => {
                // The entry was evicted or replaced without a new load taking
                // over this view.
                if owns_view {
                    state.send_replace(LoadState::Idle);
                }
                debug!("load superseded");
            }
        }

        if owns_view {
            if let Some(slot) = views.get_mut(key) {
                slot.live = None;
            }
        }
    }
}
