//! View identity types.
//! 视图标识类型。

mod collection;
mod view_key;

pub use collection::{ChainId, CollectionId};
pub use view_key::{SortDirection, ViewKey};
