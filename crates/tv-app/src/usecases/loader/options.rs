use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tv_core::Settings;

/// Callback receiving `(loaded, total)` after every applied batch.
pub type ProgressFn = Arc<dyn Fn(usize, u64) + Send + Sync>;

#[derive(Clone)]
pub struct LoadOptions {
    pub batch_size: u32,
    pub max_batches: u32,
    pub ttl: Duration,
    pub bypass_cache: bool,
    /// Concurrent batch fetches; only used with page/offset providers.
    pub max_in_flight: usize,
    pub on_progress: Option<ProgressFn>,
}

impl LoadOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            batch_size: settings.loader.batch_size.max(1),
            max_batches: settings.loader.max_batches.max(1),
            ttl: settings.cache.ttl(),
            bypass_cache: false,
            max_in_flight: settings.loader.max_in_flight.max(1),
            on_progress: None,
        }
    }

    pub fn with_bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    pub fn with_on_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(usize, u64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    /// Upper bound on items one progressive load can produce.
    pub fn item_ceiling(&self) -> u64 {
        u64::from(self.batch_size) * u64::from(self.max_batches)
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("batch_size", &self.batch_size)
            .field("max_batches", &self.max_batches)
            .field("ttl", &self.ttl)
            .field("bypass_cache", &self.bypass_cache)
            .field("max_in_flight", &self.max_in_flight)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}
