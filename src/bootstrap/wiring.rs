//! # Dependency Injection / 依赖注入模块
//!
//! The only place that knows about `tv-infra` and `tv-app` at the same time.
//! It assembles adapters behind their ports and hands them to the use cases;
//! it makes no loading decisions of its own.
//! 仅负责组装，不做任何加载决策。

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tv_app::{
    CursorPaginator, GallerySession, IndexingStatusPoller, LoadOptions, ProgressiveLoader,
    RetryController, RetryPolicy,
};
use tv_core::ports::{ClockPort, CollectionProviderPort, IndexingStatusPort};
use tv_core::{LoadMoreTrigger, Settings};
use tv_infra::{HttpCollectionProvider, InMemoryCacheStore, InMemoryProvider, SystemClock};

/// Where collection pages come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSource {
    /// The HTTP indexer configured in `[provider]`.
    Http,
    /// A synthetic in-memory collection of `records` tokens.
    Demo { records: usize },
}

/// Adapters the session is built from.
pub struct AppDeps {
    pub pages: Arc<dyn CollectionProviderPort>,
    pub indexing: Arc<dyn IndexingStatusPort>,
    pub clock: Arc<dyn ClockPort>,
}

impl AppDeps {
    /// Uses one adapter for both provider ports.
    pub fn from_provider<P>(provider: Arc<P>, clock: Arc<dyn ClockPort>) -> Self
    where
        P: CollectionProviderPort + IndexingStatusPort + 'static,
    {
        Self {
            pages: provider.clone(),
            indexing: provider,
            clock,
        }
    }
}

/// Create the provider adapters for `source`.
/// 为指定数据源创建提供者适配器。
///
/// # Errors / 错误
///
/// Returns an error when the HTTP client cannot be built from `[provider]`.
pub fn wire_dependencies(settings: &Settings, source: ProviderSource) -> anyhow::Result<AppDeps> {
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);
    let deps = match source {
        ProviderSource::Http => {
            let provider = HttpCollectionProvider::new(&settings.provider)
                .context("Failed to create HTTP collection provider")?;
            info!(base_url = %settings.provider.base_url, "using HTTP provider");
            AppDeps::from_provider(Arc::new(provider), clock)
        }
        ProviderSource::Demo { records } => {
            let provider = InMemoryProvider::sample(records, 1u64)
                .with_paging(settings.provider.paging);
            info!(records, "using in-memory demo provider");
            AppDeps::from_provider(Arc::new(provider), clock)
        }
    };
    Ok(deps)
}

/// Assemble the cache, loader, poller and session over `deps`.
pub fn build_session(settings: &Settings, deps: AppDeps) -> GallerySession {
    let cache = Arc::new(InMemoryCacheStore::new(
        settings.cache.max_entries,
        deps.clock,
    ));
    let paginator = Arc::new(CursorPaginator::new(deps.pages));
    let retry = RetryController::new(RetryPolicy::from_settings(&settings.retry));
    let loader = Arc::new(ProgressiveLoader::new(cache.clone(), paginator, retry));
    let poller = Arc::new(IndexingStatusPoller::new(deps.indexing));

    GallerySession::new(
        loader,
        poller,
        cache,
        LoadOptions::from_settings(settings),
        settings.indexing.clone(),
        LoadMoreTrigger::new(settings.viewport.load_more_margin_rows),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_wiring_accepts_default_settings() {
        let settings = Settings::default();
        assert!(wire_dependencies(&settings, ProviderSource::Http).is_ok());
    }

    #[tokio::test]
    async fn test_demo_session_loads() {
        let settings = Settings::default();
        let deps = wire_dependencies(&settings, ProviderSource::Demo { records: 30 }).unwrap();
        let session = build_session(&settings, deps);

        let mut handle = session
            .set_view_key(tv_core::ViewKey::new("0xdemo", 1u64))
            .await;
        assert_eq!(handle.wait().await, tv_core::LoadState::Loaded);
        session.shutdown().await;
    }
}
