use serde::{Deserialize, Serialize};

/// Scroll geometry of the grid. Owned by the UI event handlers, never by the
/// loader; rebuilt on every scroll, resize, or item-count change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scroll_offset: f64,
    pub viewport_height: f64,
    pub column_count: usize,
    pub row_height_estimate: f64,
    /// Extra rows materialized above and below the visible range.
    pub overscan: usize,
}

impl Viewport {
    pub fn new(
        viewport_height: f64,
        column_count: usize,
        row_height_estimate: f64,
        overscan: usize,
    ) -> Self {
        Self {
            scroll_offset: 0.0,
            viewport_height,
            column_count,
            row_height_estimate,
            overscan,
        }
    }

    pub fn scrolled_to(mut self, scroll_offset: f64) -> Self {
        self.scroll_offset = scroll_offset;
        self
    }

    pub fn columns(&self) -> usize {
        self.column_count.max(1)
    }

    /// Row estimate guarded against zero, negative and non-finite input.
    pub fn row_estimate(&self) -> f64 {
        if self.row_height_estimate.is_finite() && self.row_height_estimate > 0.0 {
            self.row_height_estimate
        } else {
            1.0
        }
    }

    pub(crate) fn top(&self) -> f64 {
        if self.scroll_offset.is_finite() {
            self.scroll_offset.max(0.0)
        } else {
            0.0
        }
    }

    pub(crate) fn height(&self) -> f64 {
        if self.viewport_height.is_finite() {
            self.viewport_height.max(0.0)
        } else {
            0.0
        }
    }

    pub fn total_rows(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.columns())
    }
}
