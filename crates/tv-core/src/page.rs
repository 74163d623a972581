//! Paging vocabulary shared by the provider port and the paginator.
//! 提供者端口与分页器共享的分页类型。

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::view::ViewKey;

/// Which paging primitive an upstream provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingStyle {
    /// 1-based page numbers.
    #[default]
    PageNumber,
    /// 0-based item offsets.
    Offset,
    /// Opaque continuation tokens handed out by the provider.
    Cursor,
}

impl PagingStyle {
    /// Page and offset providers let a caller address any batch up front.
    pub fn is_random_access(&self) -> bool {
        !matches!(self, PagingStyle::Cursor)
    }
}

/// Provider-facing position of a page request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePosition {
    Page(u32),
    Offset(u64),
    /// `None` asks for the first page.
    Cursor(Option<String>),
}

/// Opaque handle for "the next page of this sequence".
///
/// Callers above the paginator only pass cursors back; they never inspect
/// them.
/// 对调用方不透明，只能原样传回分页器。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(PagePosition);

impl Cursor {
    pub fn first(style: PagingStyle) -> Self {
        match style {
            PagingStyle::PageNumber => Cursor(PagePosition::Page(1)),
            PagingStyle::Offset => Cursor(PagePosition::Offset(0)),
            PagingStyle::Cursor => Cursor(PagePosition::Cursor(None)),
        }
    }

    pub fn from_position(position: PagePosition) -> Self {
        Cursor(position)
    }

    pub fn position(&self) -> &PagePosition {
        &self.0
    }
}

/// Everything the upstream needs for one page: the view passes sort, search
/// and filters through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub view: ViewKey,
    pub position: PagePosition,
    pub page_size: u32,
}

/// Page exactly as the provider returned it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub items: Vec<Record>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Page normalized by the paginator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageResult {
    pub items: Vec<Record>,
    pub total_count: u64,
    pub next_cursor: Option<Cursor>,
    /// Stand-in for a response that could not be used.
    pub substituted: bool,
}

impl PageResult {
    /// Zero-item page with no continuation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Empty page standing in for a malformed response. Carries no total, so
    /// it never shrinks what earlier pages advertised.
    pub fn substituted() -> Self {
        Self {
            substituted: true,
            ..Self::default()
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}
