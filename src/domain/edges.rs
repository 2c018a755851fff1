//! Edge and boundary notifications.
//!
//! [`EdgeTracker`] compares each new window against the previous one and
//! reports which boundary rows changed and whether the first/last row of the
//! sequence came into view. All signals are edge-triggered.

use serde::{Deserialize, Serialize};

use crate::domain::flatten::FlatRows;
use crate::domain::window::ViewportWindow;
use crate::traits::RowKey;

/// Kind of boundary notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    FirstReached,
    LastReached,
    FirstVisibleChanged,
    LastVisibleChanged,
}

/// A boundary notification carrying the key of the affected row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSignal {
    pub kind: EdgeKind,
    pub key: RowKey,
}

/// How a new row set relates to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSetChange {
    Unchanged,
    /// Old rows are a prefix of the new rows.
    Append,
    /// Old rows are a suffix of the new rows.
    Prepend,
    /// Anything else, including the first row set.
    Replace,
}

impl RowSetChange {
    /// Incremental changes keep edge-tracking state.
    pub fn is_incremental(self) -> bool {
        !matches!(self, RowSetChange::Replace)
    }
}

/// Classifies a row-set change by comparing root keys.
pub fn classify_change(old: &[RowKey], new: &[RowKey]) -> RowSetChange {
    if old.is_empty() {
        return RowSetChange::Replace;
    }
    if old == new {
        RowSetChange::Unchanged
    } else if new.starts_with(old) {
        RowSetChange::Append
    } else if new.ends_with(old) {
        RowSetChange::Prepend
    } else {
        RowSetChange::Replace
    }
}

/// Stateful comparator run once per window recomputation.
#[derive(Debug, Clone, Default)]
pub struct EdgeTracker {
    first_key: Option<RowKey>,
    last_key: Option<RowKey>,
    at_first: bool,
    at_last: bool,
}

impl EdgeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all boundary state; the next window fires as if new.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Observes a freshly computed window and returns the signals it causes.
    ///
    /// Signal order: `FirstVisibleChanged`, `LastVisibleChanged`,
    /// `FirstReached`, `LastReached`.
    pub fn observe(&mut self, window: Option<ViewportWindow>, rows: &FlatRows) -> Vec<EdgeSignal> {
        let mut signals = Vec::new();

        let Some(window) = window else {
            self.first_key = None;
            self.last_key = None;
            self.at_first = false;
            self.at_last = false;
            return signals;
        };

        let first_key = rows.key_at(window.start_index).cloned();
        let last_key = rows.key_at(window.end_index).cloned();

        if first_key != self.first_key {
            if let Some(key) = &first_key {
                signals.push(EdgeSignal { kind: EdgeKind::FirstVisibleChanged, key: key.clone() });
            }
        }
        if last_key != self.last_key {
            if let Some(key) = &last_key {
                signals.push(EdgeSignal { kind: EdgeKind::LastVisibleChanged, key: key.clone() });
            }
        }

        let at_first = window.start_index == 0;
        let at_last = window.end_index + 1 == rows.len();

        if at_first && !self.at_first {
            if let Some(key) = &first_key {
                signals.push(EdgeSignal { kind: EdgeKind::FirstReached, key: key.clone() });
            }
        }
        if at_last && !self.at_last {
            if let Some(key) = &last_key {
                signals.push(EdgeSignal { kind: EdgeKind::LastReached, key: key.clone() });
            }
        }

        self.first_key = first_key;
        self.last_key = last_key;
        self.at_first = at_first;
        self.at_last = at_last;
        signals
    }
}
