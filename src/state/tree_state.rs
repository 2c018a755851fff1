//! Tree expansion state management.
//!
//! This module encapsulates which rows are expanded. Entries are never
//! dropped when an ancestor collapses, so re-expanding the ancestor restores
//! the prior expansion of its descendants.

use std::collections::HashSet;

use crate::traits::RowKey;

/// State related to row expansion.
///
/// Responsibilities:
/// - Tracking which rows are expanded
/// - Providing intent-revealing expansion queries
/// - Pruning rows that no longer exist
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    /// Set of expanded row keys
    expanded: HashSet<RowKey>,
}

impl ExpansionState {
    /// Creates a new expansion state with no expanded rows.
    pub fn new() -> Self {
        Self { expanded: HashSet::new() }
    }

    // ===== Expansion Queries =====

    /// Returns a reference to the set of expanded row keys.
    ///
    /// The flattener consumes the set directly.
    pub fn expanded_keys(&self) -> &HashSet<RowKey> {
        &self.expanded
    }

    pub fn is_expanded(&self, key: &RowKey) -> bool {
        self.expanded.contains(key)
    }

    // ===== Expansion Mutations =====

    /// Expands the given row.
    ///
    /// # Returns
    /// `true` if the row was newly expanded, `false` if already expanded.
    pub fn expand(&mut self, key: RowKey) -> bool {
        self.expanded.insert(key)
    }

    /// Collapses the given row.
    ///
    /// # Returns
    /// `true` if the row was expanded and is now collapsed.
    pub fn collapse(&mut self, key: &RowKey) -> bool {
        self.expanded.remove(key)
    }

    /// Sets the expansion of a row; returns whether anything changed.
    pub fn set_expanded(&mut self, key: &RowKey, expanded: bool) -> bool {
        if expanded {
            self.expand(key.clone())
        } else {
            self.collapse(key)
        }
    }

    /// Drops entries for rows that no longer exist.
    pub fn retain(&mut self, mut exists: impl FnMut(&RowKey) -> bool) {
        self.expanded.retain(|key| exists(key));
    }
}
