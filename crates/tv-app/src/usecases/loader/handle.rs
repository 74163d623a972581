use tokio::sync::watch;
use tv_core::{LoadState, ViewKey};

/// How a `load()` call was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Fresh cache entry; no provider call was made.
    Cache,
    /// Attached to a load already running for the same view.
    Joined,
    /// Started a new generation.
    Started,
    /// Continued an existing entry by one batch.
    Continued,
}

/// Observer of one view's load state.
#[derive(Debug, Clone)]
pub struct LoadHandle {
    key: ViewKey,
    origin: LoadOrigin,
    generation: Option<u64>,
    state: watch::Receiver<LoadState>,
}

impl LoadHandle {
    pub(crate) fn new(
        key: ViewKey,
        origin: LoadOrigin,
        generation: Option<u64>,
        state: watch::Receiver<LoadState>,
    ) -> Self {
        Self {
            key,
            origin,
            generation,
            state,
        }
    }

    pub fn key(&self) -> &ViewKey {
        &self.key
    }

    pub fn origin(&self) -> LoadOrigin {
        self.origin
    }

    /// Generation doing the work, `None` for cache hits.
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.clone()
    }

    /// Waits until the load stops: `Loaded`, `Failed`, or `Idle` after a
    /// cancellation.
    pub async fn wait(&mut self) -> LoadState {
        loop {
            let current = self.state.borrow_and_update().clone();
            if !current.is_loading() {
                return current;
            }
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
        }
    }
}
