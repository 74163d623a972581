//! Windowing math: which rows of a long grid must exist as concrete UI nodes.
//! 窗口化计算：长网格中哪些行需要实际渲染。
//!
//! Everything here is a pure function of its inputs. The render path calls
//! [`compute_window`] from its scroll/resize handler with the current item
//! count, so there is no cached closure that could hold a stale count.

mod load_more;
mod row_heights;
mod viewport;
mod window;

pub use load_more::LoadMoreTrigger;
pub use row_heights::RowHeights;
pub use viewport::Viewport;
pub use window::{compute_window, compute_window_with, RowOffset, WindowRange};
