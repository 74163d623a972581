//! Use cases of the loading pipeline, leaves first.
//! 加载流水线的用例。

pub mod indexing_poller;
pub mod loader;
pub mod paginator;
pub mod retry;
pub mod session;

pub use indexing_poller::IndexingStatusPoller;
pub use loader::{LoadHandle, LoadOptions, LoadOrigin, ProgressiveLoader};
pub use paginator::{total_pages, CursorPaginator};
pub use retry::{RetryController, RetryError, RetryPolicy};
pub use session::{CellContent, ClearScope, GallerySession, RenderCell, RenderWindow};
