//! The gallery session: the surface the UI drives.
//! 图库会话：界面直接调用的入口。

mod gallery_session;
mod render;

pub use gallery_session::{ClearScope, GallerySession};
pub use render::{CellContent, RenderCell, RenderWindow};
