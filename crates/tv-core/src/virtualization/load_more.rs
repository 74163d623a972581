use super::window::WindowRange;

/// Decides when scrolling near the end of the loaded items should fetch the
/// next batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadMoreTrigger {
    /// How many rows before the last loaded item the trigger arms.
    pub margin_rows: usize,
}

impl LoadMoreTrigger {
    pub fn new(margin_rows: usize) -> Self {
        Self { margin_rows }
    }

    /// Fires when the window reaches within `margin_rows` rows of the loaded
    /// tail, more pages exist, and no fetch is already running.
    pub fn should_fire(
        &self,
        window: &WindowRange,
        columns: usize,
        loaded: usize,
        has_next_page: bool,
        in_flight: bool,
    ) -> bool {
        if !has_next_page || in_flight {
            return false;
        }
        let margin = self.margin_rows.saturating_mul(columns.max(1));
        window.end_index.saturating_add(margin) >= loaded
    }
}

impl Default for LoadMoreTrigger {
    fn default() -> Self {
        Self::new(3)
    }
}
