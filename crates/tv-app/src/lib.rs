//! # tv-app
//!
//! Application layer of tokenview. Use cases here orchestrate the `tv-core`
//! ports: they normalize paging, retry failed fetches, fill cache entries
//! batch by batch, poll indexing progress and expose the gallery session the
//! UI talks to.

pub mod usecases;

pub use usecases::{
    CellContent, ClearScope, CursorPaginator, GallerySession, IndexingStatusPoller, LoadHandle,
    LoadOptions, LoadOrigin, ProgressiveLoader, RenderCell, RenderWindow, RetryController,
    RetryError, RetryPolicy,
};
