//! Caching of measured row heights.

use std::collections::HashMap;

use crate::domain::flatten::FlatRows;
use crate::traits::RowKey;

/// Cache of row heights and their prefix sums.
///
/// Measurements are keyed by row so they survive re-flattening. The prefix
/// sums (cumulative row bottoms) are derived from the current flattened
/// sequence and are rebuilt whenever measurements or the sequence change.
#[derive(Debug, Clone, Default)]
pub struct RowHeightCache {
    /// Maps row key -> measured height in pixels.
    measured: HashMap<RowKey, f64>,

    /// Cumulative bottom edge of each flattened row.
    bottoms: Vec<f64>,

    /// Whether `bottoms` matches the current measurements and sequence.
    bottoms_valid: bool,
}

impl RowHeightCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a measured height.
    ///
    /// # Returns
    /// `true` if the stored height changed. Non-finite or negative heights
    /// are ignored.
    pub fn record(&mut self, key: RowKey, height: f64) -> bool {
        if !height.is_finite() || height < 0.0 {
            return false;
        }
        let previous = self.measured.insert(key, height);
        let changed = previous != Some(height);
        if changed {
            self.invalidate();
        }
        changed
    }

    /// Height of a row: measured if known, else the estimate.
    pub fn height_of(&self, key: &RowKey, estimate: f64) -> f64 {
        self.measured.get(key).copied().unwrap_or(estimate)
    }

    /// Invalidates the prefix sums.
    ///
    /// This should be called whenever:
    /// - The flattened sequence is rebuilt
    /// - A measurement changes
    pub fn invalidate(&mut self) {
        self.bottoms_valid = false;
    }

    /// Rebuilds the prefix sums for `rows` if they are stale.
    pub fn rebuild(&mut self, rows: &FlatRows, estimate: f64) {
        if self.bottoms_valid && self.bottoms.len() == rows.len() {
            return;
        }
        self.bottoms.clear();
        self.bottoms.reserve(rows.len());
        let mut bottom = 0.0;
        for row in rows.iter() {
            bottom += self.height_of(&row.key, estimate);
            self.bottoms.push(bottom);
        }
        self.bottoms_valid = true;
    }

    /// Cumulative row bottoms from the last rebuild.
    pub fn bottoms(&self) -> &[f64] {
        &self.bottoms
    }

    /// Drops measurements of rows that no longer exist.
    pub fn retain(&mut self, mut exists: impl FnMut(&RowKey) -> bool) {
        let before = self.measured.len();
        self.measured.retain(|key, _| exists(key));
        if self.measured.len() != before {
            self.invalidate();
        }
    }
}
