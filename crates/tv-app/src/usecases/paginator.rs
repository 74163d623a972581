//! Uniform "fetch a page" over page-number, offset and cursor providers.
//! 将页码、偏移量与游标三种分页方式统一为单一的取页操作。

use std::sync::Arc;

use tracing::debug;
use tv_core::ports::CollectionProviderPort;
use tv_core::{
    Cursor, FetchError, PagePosition, PageRequest, PageResult, PagingStyle, RawPage, ViewKey,
};

/// Number of pages needed for `total` items, e.g. 45 items of 20 per page
/// take 3 pages.
pub fn total_pages(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}

/// Adapts the provider's paging primitive to opaque [`Cursor`]s.
///
/// Never retries, never caches, and forwards sort, search and filters
/// unchanged. A request timeout is applied only when the provider
/// advertises one.
pub struct CursorPaginator {
    provider: Arc<dyn CollectionProviderPort>,
}

impl CursorPaginator {
    pub fn new(provider: Arc<dyn CollectionProviderPort>) -> Self {
        Self { provider }
    }

    pub fn paging_style(&self) -> PagingStyle {
        self.provider.paging_style()
    }

    pub fn first_cursor(&self) -> Cursor {
        Cursor::first(self.paging_style())
    }

    /// Cursor addressing batch `batch_index` directly. Only page and offset
    /// providers support this; cursor providers return `None`.
    pub fn cursor_for_batch(&self, batch_index: u32, page_size: u32) -> Option<Cursor> {
        let position = match self.paging_style() {
            PagingStyle::PageNumber => PagePosition::Page(batch_index.checked_add(1)?),
            PagingStyle::Offset => {
                PagePosition::Offset(u64::from(batch_index) * u64::from(page_size))
            }
            PagingStyle::Cursor => return None,
        };
        Some(Cursor::from_position(position))
    }

    pub async fn fetch_page(
        &self,
        view: &ViewKey,
        cursor: &Cursor,
        page_size: u32,
    ) -> Result<PageResult, FetchError> {
        let request = PageRequest {
            view: view.clone(),
            position: cursor.position().clone(),
            page_size,
        };

        let raw = match self.provider.request_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.provider.fetch_page(&request))
                .await
                .map_err(|_| FetchError::Network(format!("request timed out after {limit:?}")))??,
            None => self.provider.fetch_page(&request).await?,
        };

        let page = normalize(&request, raw);
        debug!(
            view = %view,
            position = ?request.position,
            items = page.items.len(),
            total = page.total_count,
            last = page.is_last(),
            "page fetched"
        );
        Ok(page)
    }
}

/// Derives the next cursor. Page and offset providers are exhausted once the
/// advertised total is covered; an empty page always ends the sequence.
fn normalize(request: &PageRequest, raw: RawPage) -> PageResult {
    let size = u64::from(request.page_size);
    let next = if raw.items.is_empty() {
        None
    } else {
        match &request.position {
            PagePosition::Page(page) => (u64::from(*page) * size < raw.total_count)
                .then(|| PagePosition::Page(page.saturating_add(1))),
            PagePosition::Offset(offset) => {
                let next = offset.saturating_add(size);
                (next < raw.total_count).then_some(PagePosition::Offset(next))
            }
            PagePosition::Cursor(_) => raw
                .next_cursor
                .filter(|c| !c.is_empty())
                .map(|c| PagePosition::Cursor(Some(c))),
        }
    };

    PageResult {
        items: raw.items,
        total_count: raw.total_count,
        next_cursor: next.map(Cursor::from_position),
        substituted: false,
    }
}
