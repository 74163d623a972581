use serde::Serialize;
use tv_core::{IndexingStatus, LoadState, Record, ViewKey, WindowRange};

/// What one materialized grid cell shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellContent {
    Record(Record),
    /// Slot whose record has not arrived yet; never clickable.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderCell {
    pub index: usize,
    pub content: CellContent,
}

impl RenderCell {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, CellContent::Placeholder)
    }

    pub fn record(&self) -> Option<&Record> {
        match &self.content {
            CellContent::Record(record) => Some(record),
            CellContent::Placeholder => None,
        }
    }
}

/// Everything the presentation layer needs to draw the current viewport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderWindow {
    pub view: ViewKey,
    pub window: WindowRange,
    pub cells: Vec<RenderCell>,
    /// Real records loaded so far, independent of the window.
    pub loaded: usize,
    pub has_more: bool,
    pub progress: u8,
    pub load_state: LoadState,
    pub indexing: IndexingStatus,
    /// The load finished and the view matched nothing.
    pub empty_result: bool,
    pub total_height: f64,
}

impl RenderWindow {
    pub fn record_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_placeholder()).count()
    }

    pub fn placeholder_count(&self) -> usize {
        self.cells.len() - self.record_count()
    }
}
