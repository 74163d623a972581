use std::time::Duration;

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::page::{PageRequest, PagingStyle, RawPage};

/// Upstream source of collection pages.
///
/// Implementations classify their own failures into [`FetchError`]; they do
/// not retry, cache, or interpret sort/filter parameters beyond forwarding
/// them.
/// 实现方负责错误分类，但不做重试、缓存或参数解释。
#[async_trait]
pub trait CollectionProviderPort: Send + Sync {
    /// Paging primitive this provider speaks.
    fn paging_style(&self) -> PagingStyle;

    /// Per-request timeout. Only strictly rate-limited providers advertise
    /// one; slow-but-unbounded providers return `None` and rely on the
    /// retry ceiling alone.
    fn request_timeout(&self) -> Option<Duration> {
        None
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<RawPage, FetchError>;
}
