use std::ops::Range;

use serde::Serialize;

use super::row_heights::RowHeights;
use super::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowOffset {
    pub row: usize,
    pub offset: f64,
    pub height: f64,
}

/// Item indices `[start_index, end_index)` that must be materialized now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRange {
    pub start_index: usize,
    pub end_index: usize,
    pub start_row: usize,
    pub end_row: usize,
    /// Rows intersecting the viewport, before overscan.
    pub visible_rows: Range<usize>,
    pub row_offsets: Vec<RowOffset>,
    /// Scrollable height of the whole grid.
    pub total_height: f64,
}

impl WindowRange {
    pub fn empty() -> Self {
        Self {
            start_index: 0,
            end_index: 0,
            start_row: 0,
            end_row: 0,
            visible_rows: 0..0,
            row_offsets: Vec::new(),
            total_height: 0.0,
        }
    }

    pub fn indices(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    /// Upper bound on cells for this viewport:
    /// `(visible rows + 2 * overscan) * columns`.
    pub fn node_budget(&self, viewport: &Viewport) -> usize {
        (self.visible_rows.len() + 2 * viewport.overscan) * viewport.columns()
    }
}

/// Window for `item_count` items using the viewport's row estimate only.
pub fn compute_window(viewport: &Viewport, item_count: usize) -> WindowRange {
    compute_window_with(viewport, item_count, &RowHeights::default())
}

/// Window honoring measured row heights where available.
///
/// The size of the result depends on viewport geometry and overscan, never on
/// `item_count`: a list of fifty items and one of five hundred thousand
/// produce windows of the same size for the same viewport.
pub fn compute_window_with(
    viewport: &Viewport,
    item_count: usize,
    heights: &RowHeights,
) -> WindowRange {
    let columns = viewport.columns();
    let total_rows = viewport.total_rows(item_count);
    if total_rows == 0 {
        return WindowRange::empty();
    }

    let estimate = viewport.row_estimate();
    let top = viewport.top();
    let bottom = top + viewport.height();

    let first = heights.row_at_offset(top, total_rows, estimate);
    let visible_rows = if viewport.height() <= 0.0 {
        first..first
    } else {
        let mut last = heights.row_at_offset(bottom, total_rows, estimate);
        // A row starting exactly at the bottom edge is not visible.
        if last > first && heights.offset_of(last, estimate) >= bottom {
            last -= 1;
        }
        first..last + 1
    };

    let start_row = visible_rows.start.saturating_sub(viewport.overscan);
    let end_row = (visible_rows.end + viewport.overscan).min(total_rows);

    let mut row_offsets = Vec::with_capacity(end_row - start_row);
    let mut offset = heights.offset_of(start_row, estimate);
    for row in start_row..end_row {
        let height = heights.height_of(row, estimate);
        row_offsets.push(RowOffset { row, offset, height });
        offset += height;
    }

    WindowRange {
        start_index: start_row * columns,
        end_index: (end_row * columns).min(item_count),
        start_row,
        end_row,
        visible_rows,
        row_offsets,
        total_height: heights.total_height(total_rows, estimate),
    }
}
