use std::collections::BTreeMap;

/// Measured row heights layered over the viewport's estimate.
///
/// Rows that were never measured use the estimate. Offsets are computed as
/// `row * estimate` plus the accumulated correction of measured rows above,
/// so lookups stay cheap even for very long lists with few measurements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowHeights {
    measured: BTreeMap<usize, f64>,
}

impl RowHeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a measurement. Non-finite or non-positive heights are ignored.
    pub fn set(&mut self, row: usize, height: f64) {
        if height.is_finite() && height > 0.0 {
            self.measured.insert(row, height);
        }
    }

    pub fn clear(&mut self) {
        self.measured.clear();
    }

    pub fn len(&self) -> usize {
        self.measured.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measured.is_empty()
    }

    pub fn height_of(&self, row: usize, estimate: f64) -> f64 {
        self.measured.get(&row).copied().unwrap_or(estimate)
    }

    /// Top edge of `row`.
    pub fn offset_of(&self, row: usize, estimate: f64) -> f64 {
        let correction: f64 = self
            .measured
            .range(..row)
            .map(|(_, h)| h - estimate)
            .sum();
        row as f64 * estimate + correction
    }

    pub fn total_height(&self, total_rows: usize, estimate: f64) -> f64 {
        self.offset_of(total_rows, estimate)
    }

    /// Row containing `offset`, clamped to `0..total_rows`.
    pub fn row_at_offset(&self, offset: f64, total_rows: usize, estimate: f64) -> usize {
        if total_rows == 0 {
            return 0;
        }
        let last = total_rows - 1;
        if self.measured.is_empty() {
            let row = (offset / estimate).floor();
            return if row <= 0.0 {
                0
            } else {
                (row as usize).min(last)
            };
        }

        let (mut lo, mut hi) = (0usize, last);
        while lo < hi {
            let mid = lo + (hi - lo).div_ceil(2);
            if self.offset_of(mid, estimate) <= offset {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }
}
