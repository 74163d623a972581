//! Use case wiring the loader, poller and virtualization for one gallery.
//! 为单个图库组合加载器、轮询器与虚拟化计算。

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};
use tv_core::ports::CacheStorePort;
use tv_core::settings::IndexingSettings;
use tv_core::virtualization::compute_window_with;
use tv_core::{
    IndexingStatus, LoadMoreTrigger, LoadState, RowHeights, SessionError, ViewKey, Viewport,
};

use super::render::{CellContent, RenderCell, RenderWindow};
use crate::usecases::indexing_poller::IndexingStatusPoller;
use crate::usecases::loader::{LoadHandle, LoadOptions, ProgressiveLoader};

/// Which cache entries `clear_cache` drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearScope {
    View(ViewKey),
    All,
}

/// One user's gallery: owns the active view and turns user actions into
/// loader calls.
///
/// Switching views cancels the previous view's load and indexing watch.
/// Nothing here mutates cache entries directly; the loader is the only
/// writer.
pub struct GallerySession {
    loader: Arc<ProgressiveLoader>,
    poller: Arc<IndexingStatusPoller>,
    cache: Arc<dyn CacheStorePort>,
    options: LoadOptions,
    indexing: IndexingSettings,
    trigger: LoadMoreTrigger,
    active: Mutex<Option<ActiveView>>,
    heights: StdMutex<RowHeights>,
}

struct ActiveView {
    key: ViewKey,
    indexing_cancel: CancellationToken,
    indexing: watch::Receiver<IndexingStatus>,
}

impl GallerySession {
    pub fn new(
        loader: Arc<ProgressiveLoader>,
        poller: Arc<IndexingStatusPoller>,
        cache: Arc<dyn CacheStorePort>,
        options: LoadOptions,
        indexing: IndexingSettings,
        trigger: LoadMoreTrigger,
    ) -> Self {
        Self {
            loader,
            poller,
            cache,
            options,
            indexing,
            trigger,
            active: Mutex::new(None),
            heights: StdMutex::new(RowHeights::new()),
        }
    }

    fn heights(&self) -> MutexGuard<'_, RowHeights> {
        self.heights
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes `key` the active view and loads it.
    ///
    /// Re-selecting the active view only loads (which joins a running load
    /// or hits the cache); it does not cancel anything.
    pub async fn set_view_key(&self, key: ViewKey) -> LoadHandle {
        let span = info_span!("usecase.gallery_session.set_view_key", view = %key);

        async {
            let mut active = self.active.lock().await;
            let same_view = active.as_ref().map(|a| a.key == key).unwrap_or(false);

            if !same_view {
                if let Some(previous) = active.take() {
                    previous.indexing_cancel.cancel();
                    self.loader.cancel(&previous.key).await;
                    info!(previous = %previous.key, "active view changed");
                }
                self.heights().clear();

                let indexing_cancel = CancellationToken::new();
                let indexing = self.watch_indexing(&key, indexing_cancel.clone());
                *active = Some(ActiveView {
                    key: key.clone(),
                    indexing_cancel,
                    indexing,
                });
            }

            self.loader.load(key, self.options.clone()).await
        }
        .instrument(span)
        .await
    }

    fn watch_indexing(
        &self,
        key: &ViewKey,
        cancel: CancellationToken,
    ) -> watch::Receiver<IndexingStatus> {
        if self.indexing.enabled {
            self.poller.watch(
                key.collection().clone(),
                self.indexing.poll_interval(),
                cancel,
            )
        } else {
            watch::channel(IndexingStatus::completed()).1
        }
    }

    pub async fn active_view(&self) -> Option<ViewKey> {
        self.active.lock().await.as_ref().map(|a| a.key.clone())
    }

    async fn active_key(&self) -> Result<ViewKey, SessionError> {
        self.active_view().await.ok_or(SessionError::NoActiveView)
    }

    /// Refetches the active view, ignoring any fresh cache entry. Items
    /// already shown stay visible until the first new batch replaces them.
    pub async fn refresh(&self) -> Result<LoadHandle, SessionError> {
        let key = self.active_key().await?;
        self.loader.cancel(&key).await;
        info!(view = %key, "refresh requested");
        Ok(self
            .loader
            .load(key, self.options.clone().with_bypass_cache(true))
            .await)
    }

    /// Drops cache entries. When the active view was dropped it is loaded
    /// again from scratch and its handle returned.
    pub async fn clear_cache(&self, scope: ClearScope) -> Option<LoadHandle> {
        let active = self.active_view().await;
        let reload = match &scope {
            ClearScope::View(key) => {
                self.loader.cancel(key).await;
                self.cache.invalidate(key).await;
                info!(view = %key, "cache cleared for view");
                active.filter(|a| a == key)
            }
            ClearScope::All => {
                self.loader.cancel_all().await;
                self.cache.invalidate_all().await;
                info!("cache cleared");
                active
            }
        };

        match reload {
            Some(key) => Some(self.loader.load(key, self.options.clone()).await),
            None => None,
        }
    }

    /// Restarts a failed load. Only valid while the active view is `Failed`.
    pub async fn retry(&self) -> Result<LoadHandle, SessionError> {
        let key = self.active_key().await?;
        let state = self.loader.state(&key).await;
        if !state.is_failed() {
            return Err(SessionError::RetryNotAllowed(state.label()));
        }
        info!(view = %key, "manual retry");
        Ok(self
            .loader
            .load(key, self.options.clone().with_bypass_cache(true))
            .await)
    }

    /// Fetches the next batch of the active view, if there is one and
    /// nothing is loading.
    pub async fn load_more(&self) -> Option<LoadHandle> {
        let key = self.active_view().await?;
        self.loader.load_next_batch(&key, self.options.clone()).await
    }

    pub async fn load_state(&self) -> LoadState {
        match self.active_view().await {
            Some(key) => self.loader.state(&key).await,
            None => LoadState::Idle,
        }
    }

    pub async fn subscribe(&self) -> Result<watch::Receiver<LoadState>, SessionError> {
        let key = self.active_key().await?;
        Ok(self.loader.subscribe(&key).await)
    }

    pub async fn indexing_status(&self) -> IndexingStatus {
        let active = self.active.lock().await;
        let status = active
            .as_ref()
            .map(|a| *a.indexing.borrow())
            .unwrap_or_default();
        status
    }

    /// Records the measured height of `row` for later windows.
    pub fn set_row_height(&self, row: usize, height: f64) {
        self.heights().set(row, height);
    }

    /// Cells to materialize for `viewport` over the active view.
    ///
    /// Only the records inside the window are read from the cache; slots
    /// past the loaded items render as placeholders.
    pub async fn render_window(&self, viewport: &Viewport) -> Result<RenderWindow, SessionError> {
        let (key, indexing) = {
            let active = self.active.lock().await;
            let view = active.as_ref().ok_or(SessionError::NoActiveView)?;
            let snapshot = (view.key.clone(), *view.indexing.borrow());
            snapshot
        };

        let stats = self.cache.stats(&key).await.unwrap_or_default();
        let load_state = self.loader.state(&key).await;
        let window = {
            let heights = self.heights();
            compute_window_with(viewport, stats.display_count(), &heights)
        };
        let records = self.cache.read_range(&key, window.indices()).await;

        let cells = window
            .indices()
            .map(|index| {
                let content = records
                    .get(index - window.start_index)
                    .cloned()
                    .map(CellContent::Record)
                    .unwrap_or(CellContent::Placeholder);
                RenderCell { index, content }
            })
            .collect();

        Ok(RenderWindow {
            empty_result: load_state == LoadState::Loaded
                && stats.loaded == 0
                && !stats.has_next_page,
            progress: load_state.progress(),
            total_height: window.total_height,
            view: key,
            window,
            cells,
            loaded: stats.loaded,
            has_more: stats.has_next_page,
            load_state,
            indexing,
        })
    }

    /// Scroll/resize handler: renders, then requests the next batch when the
    /// window nears the end of the loaded items.
    pub async fn on_viewport_changed(
        &self,
        viewport: &Viewport,
    ) -> Result<RenderWindow, SessionError> {
        let render = self.render_window(viewport).await?;
        let fire = self.trigger.should_fire(
            &render.window,
            viewport.columns(),
            render.loaded,
            render.has_more,
            render.load_state.is_loading(),
        );
        if fire {
            debug!(end = render.window.end_index, loaded = render.loaded, "load-more triggered");
            self.load_more().await;
        }
        Ok(render)
    }

    /// Cancels the active view's work and every running load.
    pub async fn shutdown(&self) {
        if let Some(active) = self.active.lock().await.take() {
            active.indexing_cancel.cancel();
        }
        self.loader.cancel_all().await;
        self.loader.shutdown();
        info!("gallery session shut down");
    }
}
