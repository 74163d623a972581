//! # tv-core
//!
//! Core domain models and business rules for tokenview.
//!
//! This crate contains pure logic without any infrastructure dependencies:
//! view identity, records, load states, cache entries, the ports the
//! application layer talks to, and the virtualization math that maps a
//! viewport onto a (possibly still loading) item list.

pub mod cache;
pub mod errors;
pub mod indexing;
pub mod load_state;
pub mod page;
pub mod ports;
pub mod record;
pub mod settings;
pub mod view;
pub mod virtualization;

// Re-export commonly used types at the crate root
pub use cache::{ApplyOutcome, CacheEntry, Continuation, EntryStats};
pub use errors::{FetchError, SessionError, TerminalError};
pub use indexing::{IndexingPhase, IndexingStatus};
pub use load_state::LoadState;
pub use page::{Cursor, PagePosition, PageRequest, PageResult, PagingStyle, RawPage};
pub use record::{Attribute, Record};
pub use settings::Settings;
pub use view::{ChainId, CollectionId, SortDirection, ViewKey};
pub use virtualization::{compute_window, LoadMoreTrigger, RowHeights, Viewport, WindowRange};
