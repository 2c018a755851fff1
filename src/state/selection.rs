//! Row selection state management.
//!
//! [`SelectionTracker`] owns the set of selected rows and applies the
//! selection-mode rules on every toggle. With parent propagation enabled,
//! a toggle updates the row's flattened subtree and then rechecks each
//! ancestor, nearest first, so that a parent is selected exactly when all of
//! its flattened children are.
//!
//! Without a matcher, membership is a key lookup and the ancestor recheck
//! reads per-parent selected-children counts, so a toggle costs the size of
//! the toggled subtree plus the depth of the row. When a custom matcher is
//! installed it replaces key equality for every membership check, including
//! the checks made during parent propagation; those checks scan the
//! selection.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::domain::flatten::FlatRows;
use crate::traits::{RowKey, RowValue};

/// Row selection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Toggles do nothing.
    None,
    /// At most one row is selected; toggling it again clears the selection.
    Single,
    /// Any subset of rows may be selected.
    #[default]
    Multiple,
}

/// Compares a selected row value (first) against a candidate row value.
pub type SelectionMatcher<R> = Rc<dyn Fn(&R, &R) -> bool>;

/// Selection as reported to the host: one value or a list, by mode.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionValue<R> {
    Single(Option<R>),
    Multiple(Vec<R>),
}

impl<R> SelectionValue<R> {
    pub fn len(&self) -> usize {
        match self {
            SelectionValue::Single(value) => usize::from(value.is_some()),
            SelectionValue::Multiple(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A selected row and its position in selection order.
#[derive(Clone)]
struct Selected<R> {
    seq: u64,
    value: R,
}

/// Selected and total direct children per row of one flattened sequence.
#[derive(Debug, Clone)]
struct ChildCounts {
    generation: u64,
    selected: Vec<usize>,
    total: Vec<usize>,
}

/// State related to row selection.
///
/// Responsibilities:
/// - Tracking selected rows in selection order
/// - Enforcing none/single/multiple rules per toggle
/// - Parent/child propagation over the flattened sequence
/// - Pruning rows that disappeared from the data set
#[derive(Clone)]
pub struct SelectionTracker<R> {
    /// Selected rows by key
    entries: HashMap<RowKey, Selected<R>>,
    /// Selection order: sequence number → key
    order: BTreeMap<u64, RowKey>,
    next_seq: u64,
    /// Optional replacement for key equality
    matcher: Option<SelectionMatcher<R>>,
    /// Built lazily for propagation; only kept while no matcher is set
    counts: Option<ChildCounts>,
}

impl<R> Default for SelectionTracker<R> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            matcher: None,
            counts: None,
        }
    }
}

impl<R> fmt::Debug for SelectionTracker<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionTracker")
            .field("keys", &self.order.values().collect::<Vec<_>>())
            .field("has_matcher", &self.matcher.is_some())
            .finish()
    }
}

impl<R: RowValue> SelectionTracker<R> {
    /// Creates a tracker with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_matcher(&mut self, matcher: Option<SelectionMatcher<R>>) {
        self.matcher = matcher;
        self.counts = None;
    }

    /// Compares two row values with the matcher; `None` without a matcher.
    pub fn matcher_matches(&self, selected: &R, row: &R) -> Option<bool> {
        self.matcher.as_ref().map(|matcher| matcher(selected, row))
    }

    // ===== Selection Queries =====

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selected keys in selection order.
    pub fn selected_keys(&self) -> impl Iterator<Item = &RowKey> + '_ {
        self.order.values()
    }

    /// Selected row values in selection order.
    pub fn selected_values(&self) -> Vec<R> {
        self.order
            .values()
            .filter_map(|key| self.entries.get(key))
            .map(|selected| selected.value.clone())
            .collect()
    }

    /// Membership of the row `(key, value)`, through the matcher if set.
    pub fn is_selected(&self, key: &RowKey, value: &R) -> bool {
        match &self.matcher {
            Some(matcher) => self.entries.values().any(|selected| matcher(&selected.value, value)),
            None => self.entries.contains_key(key),
        }
    }

    /// Membership of the flattened row at `index`.
    pub fn is_index_selected(&self, rows: &FlatRows, forest: &[R], index: usize) -> bool {
        match (rows.get(index), rows.value(forest, index)) {
            (Some(row), Some(value)) => self.is_selected(&row.key, value),
            _ => false,
        }
    }

    /// The selection shaped for `mode`.
    pub fn value_for(&self, mode: SelectionMode) -> SelectionValue<R> {
        match mode {
            SelectionMode::Single => SelectionValue::Single(
                self.order
                    .values()
                    .next()
                    .and_then(|key| self.entries.get(key))
                    .map(|selected| selected.value.clone()),
            ),
            SelectionMode::None | SelectionMode::Multiple => {
                SelectionValue::Multiple(self.selected_values())
            }
        }
    }

    // ===== Selection Mutations =====

    /// Toggles the flattened row at `index` under `mode`.
    ///
    /// # Returns
    /// `true` if the toggle applied. `None` mode and indices outside the
    /// sequence are no-ops.
    pub fn toggle(
        &mut self,
        index: usize,
        mode: SelectionMode,
        propagate: bool,
        rows: &FlatRows,
        forest: &[R],
    ) -> bool {
        let (Some(row), Some(value)) = (rows.get(index), rows.value(forest, index)) else {
            return false;
        };

        match mode {
            SelectionMode::None => false,
            SelectionMode::Single => {
                let was_selected = self.is_selected(&row.key, value);
                self.clear();
                if !was_selected {
                    self.set(&row.key, value, true);
                }
                true
            }
            SelectionMode::Multiple => {
                let select = !self.is_selected(&row.key, value);
                if propagate {
                    self.ensure_counts(rows);
                }
                self.set_index(rows, forest, index, select);
                if propagate {
                    for descendant in rows.descendant_indices(index) {
                        self.set_index(rows, forest, descendant, select);
                    }
                    self.recheck_ancestors(index, rows, forest);
                }
                true
            }
        }
    }

    /// Restores parent/child agreement inside the flattened subtree of
    /// `index`, typically right after that row was expanded.
    ///
    /// Rows whose children were hidden while their own membership changed
    /// come back out of step. Walking top-down, a row whose membership
    /// disagrees with its children's imposes it on its whole flattened
    /// subtree. Ancestors of `index` are unaffected since `index` keeps its
    /// own membership.
    ///
    /// # Returns
    /// `true` if any row's membership changed.
    pub fn cover_revealed_subtree(&mut self, index: usize, rows: &FlatRows, forest: &[R]) -> bool {
        let Some(root) = rows.get(index) else {
            return false;
        };
        self.ensure_counts(rows);

        let end = index + 1 + root.descendant_count;
        let mut changed = false;
        let mut current = index;
        while current < end {
            let Some(row) = rows.get(current) else {
                break;
            };
            let subtree = rows.descendant_indices(current);
            if !subtree.is_empty() {
                let selected = self.is_index_selected(rows, forest, current);
                if selected != self.children_selected(rows, forest, current) {
                    for descendant in subtree {
                        changed |= self.set_index(rows, forest, descendant, selected);
                    }
                    current += 1 + row.descendant_count;
                    continue;
                }
            }
            current += 1;
        }
        changed
    }

    /// Replaces the whole selection, honoring `mode` cardinality.
    pub fn replace(&mut self, selected: Vec<(RowKey, R)>, mode: SelectionMode) {
        self.clear();
        let limit = match mode {
            SelectionMode::None => 0,
            SelectionMode::Single => 1,
            SelectionMode::Multiple => usize::MAX,
        };
        for (key, value) in selected.into_iter().take(limit) {
            self.set(&key, &value, true);
        }
    }

    /// Drops entries whose key no longer resolves and refreshes the stored
    /// values of the rest.
    ///
    /// # Returns
    /// `true` if at least one entry was pruned.
    pub fn reconcile(&mut self, mut lookup: impl FnMut(&RowKey) -> Option<R>) -> bool {
        self.counts = None;
        let before = self.entries.len();
        let keys: Vec<RowKey> = self.order.values().cloned().collect();
        for key in keys {
            match lookup(&key) {
                Some(value) => {
                    if let Some(selected) = self.entries.get_mut(&key) {
                        selected.value = value;
                    }
                }
                None => self.remove(&key),
            }
        }
        self.entries.len() != before
    }

    /// Clears the selection; returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.entries.is_empty();
        self.entries.clear();
        self.order.clear();
        self.counts = None;
        had_any
    }

    fn insert(&mut self, key: RowKey, value: R) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key.clone());
        if let Some(previous) = self.entries.insert(key, Selected { seq, value }) {
            self.order.remove(&previous.seq);
        }
    }

    fn remove(&mut self, key: &RowKey) {
        if let Some(selected) = self.entries.remove(key) {
            self.order.remove(&selected.seq);
        }
    }

    fn set(&mut self, key: &RowKey, value: &R, selected: bool) {
        if selected {
            if !self.is_selected(key, value) {
                self.insert(key.clone(), value.clone());
            }
            return;
        }

        self.remove(key);
        if let Some(matcher) = self.matcher.clone() {
            let matching: Vec<RowKey> = self
                .entries
                .iter()
                .filter(|(_, entry)| matcher(&entry.value, value))
                .map(|(k, _)| k.clone())
                .collect();
            for k in matching {
                self.remove(&k);
            }
        }
    }

    /// Sets the membership of the flattened row at `index`, keeping the
    /// parent's child count in step.
    ///
    /// # Returns
    /// `true` if the membership changed.
    fn set_index(&mut self, rows: &FlatRows, forest: &[R], index: usize, selected: bool) -> bool {
        let (Some(row), Some(value)) = (rows.get(index), rows.value(forest, index)) else {
            return false;
        };
        if self.is_selected(&row.key, value) == selected {
            return false;
        }
        self.set(&row.key, value, selected);

        let counts = self.counts.as_mut().filter(|c| c.generation == rows.generation());
        if let (Some(counts), Some(parent)) = (counts, row.parent_index) {
            let count = &mut counts.selected[parent];
            if selected {
                *count += 1;
            } else {
                *count = count.saturating_sub(1);
            }
        }
        true
    }

    /// Builds child counts for `rows` unless they are current. Counts rely
    /// on key membership, so they are dropped while a matcher is set.
    fn ensure_counts(&mut self, rows: &FlatRows) {
        if self.matcher.is_some() {
            self.counts = None;
            return;
        }
        if self.counts.as_ref().is_some_and(|c| c.generation == rows.generation()) {
            return;
        }

        let mut selected = vec![0; rows.len()];
        let mut total = vec![0; rows.len()];
        for row in rows.iter() {
            if let Some(parent) = row.parent_index {
                total[parent] += 1;
                if self.entries.contains_key(&row.key) {
                    selected[parent] += 1;
                }
            }
        }
        self.counts = Some(ChildCounts { generation: rows.generation(), selected, total });
    }

    /// Whether every flattened child of `parent` is selected.
    fn children_selected(&self, rows: &FlatRows, forest: &[R], parent: usize) -> bool {
        match self.counts.as_ref().filter(|c| c.generation == rows.generation()) {
            Some(counts) => counts.selected[parent] == counts.total[parent],
            None => rows.child_indices(parent).all(|child| self.is_index_selected(rows, forest, child)),
        }
    }

    /// Bottom-up recheck: each ancestor is selected iff all its flattened
    /// children are.
    fn recheck_ancestors(&mut self, index: usize, rows: &FlatRows, forest: &[R]) {
        let ancestors: Vec<usize> = rows.ancestor_indices(index).collect();
        for parent in ancestors {
            let all_selected = self.children_selected(rows, forest, parent);
            self.set_index(rows, forest, parent, all_selected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::domain::flatten::flatten;
    use crate::traits::KeyAccessor;
    use serde_json::{json, Value};

    fn forest() -> Vec<Value> {
        vec![
            json!({"id": "P", "group": 1, "children": [
                {"id": "C1", "group": 2},
                {"id": "C2", "group": 2, "children": [{"id": "G1", "group": 3}, {"id": "G2", "group": 3}]}
            ]}),
            json!({"id": "Q", "group": 1}),
        ]
    }

    fn flat(forest: &[Value], expanded: &[&str]) -> FlatRows {
        let expanded = expanded.iter().map(|k| RowKey::from(*k)).collect();
        flatten(forest, &expanded, TreeConfig::Tree { collapsible: true }, &KeyAccessor::by_attr("id"))
    }

    fn keys(tracker: &SelectionTracker<Value>) -> Vec<&str> {
        let mut keys: Vec<&str> = tracker.selected_keys().map(RowKey::as_str).collect();
        keys.sort();
        keys
    }

    fn index(rows: &FlatRows, key: &str) -> usize {
        rows.index_of(&RowKey::from(key)).unwrap()
    }

    #[test]
    fn test_none_mode_is_noop() {
        let forest = forest();
        let rows = flat(&forest, &[]);
        let mut tracker = SelectionTracker::new();
        assert!(!tracker.toggle(0, SelectionMode::None, false, &rows, &forest));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_single_mode_replaces_and_deselects() {
        let forest = forest();
        let rows = flat(&forest, &[]);
        let mut tracker = SelectionTracker::new();
        tracker.toggle(0, SelectionMode::Single, false, &rows, &forest);
        tracker.toggle(1, SelectionMode::Single, false, &rows, &forest);
        assert_eq!(keys(&tracker), vec!["Q"]);
        tracker.toggle(1, SelectionMode::Single, false, &rows, &forest);
        assert!(tracker.is_empty());
        assert_eq!(tracker.value_for(SelectionMode::Single), SelectionValue::Single(None));
    }

    #[test]
    fn test_multiple_mode_flips_one_key() {
        let forest = forest();
        let rows = flat(&forest, &[]);
        let mut tracker = SelectionTracker::new();
        tracker.toggle(0, SelectionMode::Multiple, false, &rows, &forest);
        tracker.toggle(1, SelectionMode::Multiple, false, &rows, &forest);
        assert_eq!(keys(&tracker), vec!["P", "Q"]);
        tracker.toggle(0, SelectionMode::Multiple, false, &rows, &forest);
        assert_eq!(keys(&tracker), vec!["Q"]);
    }

    #[test]
    fn test_stale_index_is_noop() {
        let forest = forest();
        let rows = flat(&forest, &[]);
        let mut tracker = SelectionTracker::new();
        assert!(!tracker.toggle(42, SelectionMode::Multiple, false, &rows, &forest));
    }

    #[test]
    fn test_children_select_parent() {
        let forest = forest();
        let rows = flat(&forest, &["P"]);
        let mut tracker = SelectionTracker::new();

        tracker.toggle(index(&rows, "C1"), SelectionMode::Multiple, true, &rows, &forest);
        assert_eq!(keys(&tracker), vec!["C1"]);

        tracker.toggle(index(&rows, "C2"), SelectionMode::Multiple, true, &rows, &forest);
        assert_eq!(keys(&tracker), vec!["C1", "C2", "P"]);

        tracker.toggle(index(&rows, "C1"), SelectionMode::Multiple, true, &rows, &forest);
        assert_eq!(keys(&tracker), vec!["C2"]);
    }

    #[test]
    fn test_parent_toggle_cascades_to_flattened_descendants() {
        let forest = forest();
        let rows = flat(&forest, &["P", "C2"]);
        let mut tracker = SelectionTracker::new();

        tracker.toggle(index(&rows, "P"), SelectionMode::Multiple, true, &rows, &forest);
        assert_eq!(keys(&tracker), vec!["C1", "C2", "G1", "G2", "P"]);

        tracker.toggle(index(&rows, "G1"), SelectionMode::Multiple, true, &rows, &forest);
        assert_eq!(keys(&tracker), vec!["C1", "G2"]);
    }

    #[test]
    fn test_revealed_children_follow_collapsed_parent() {
        let forest = forest();
        let collapsed = flat(&forest, &[]);
        let mut tracker = SelectionTracker::new();
        tracker.toggle(index(&collapsed, "P"), SelectionMode::Multiple, true, &collapsed, &forest);
        assert_eq!(keys(&tracker), vec!["P"]);

        let expanded = flat(&forest, &["P"]);
        assert!(tracker.cover_revealed_subtree(index(&expanded, "P"), &expanded, &forest));
        assert_eq!(keys(&tracker), vec!["C1", "C2", "P"]);

        // C2 was still collapsed; its children follow once it opens.
        let deeper = flat(&forest, &["P", "C2"]);
        assert!(tracker.cover_revealed_subtree(index(&deeper, "C2"), &deeper, &forest));
        assert_eq!(keys(&tracker), vec!["C1", "C2", "G1", "G2", "P"]);
        assert!(!tracker.cover_revealed_subtree(index(&deeper, "P"), &deeper, &forest));
    }

    #[test]
    fn test_revealed_children_follow_parent_deselected_while_collapsed() {
        let forest = forest();
        let mut tracker = SelectionTracker::new();
        tracker.replace(
            vec![(RowKey::from("C1"), json!({"id": "C1"})), (RowKey::from("C2"), json!({"id": "C2"}))],
            SelectionMode::Multiple,
        );

        let expanded = flat(&forest, &["P"]);
        assert!(tracker.cover_revealed_subtree(index(&expanded, "P"), &expanded, &forest));
        assert!(tracker.is_empty());
        assert!(!tracker.cover_revealed_subtree(99, &expanded, &forest));
    }

    #[test]
    fn test_wide_parent_tracks_selected_children() {
        let children: Vec<Value> = (0..500).map(|i| json!({"id": format!("c{i}")})).collect();
        let forest = vec![json!({"id": "root", "children": children})];
        let rows = flat(&forest, &["root"]);
        let mut tracker = SelectionTracker::new();

        for i in 1..rows.len() {
            tracker.toggle(i, SelectionMode::Multiple, true, &rows, &forest);
            assert_eq!(tracker.is_index_selected(&rows, &forest, 0), i == rows.len() - 1);
        }
        assert_eq!(tracker.len(), 501);

        tracker.toggle(0, SelectionMode::Multiple, true, &rows, &forest);
        assert!(tracker.is_empty());

        tracker.toggle(0, SelectionMode::Multiple, true, &rows, &forest);
        assert_eq!(tracker.len(), 501);
        tracker.toggle(250, SelectionMode::Multiple, true, &rows, &forest);
        assert!(!tracker.is_index_selected(&rows, &forest, 0));
        assert_eq!(tracker.len(), 499);

        // Selection order survives removals.
        assert_eq!(tracker.selected_keys().next().map(RowKey::as_str), Some("c0"));
    }

    #[test]
    fn test_propagation_uses_matcher() {
        let forest = forest();
        let rows = flat(&forest, &["P"]);
        let mut tracker = SelectionTracker::new();
        // Rows match when they share a group.
        tracker.set_matcher(Some(Rc::new(|a: &Value, b: &Value| a.get("group") == b.get("group"))));

        // C1 and C2 share group 2, so selecting C1 also satisfies C2 and
        // the parent recheck selects P.
        tracker.toggle(index(&rows, "C1"), SelectionMode::Multiple, true, &rows, &forest);
        assert!(tracker.is_index_selected(&rows, &forest, index(&rows, "C2")));
        assert!(tracker.is_index_selected(&rows, &forest, index(&rows, "P")));
        // Q matches P through group 1.
        assert!(tracker.is_index_selected(&rows, &forest, index(&rows, "Q")));
        assert_eq!(keys(&tracker), vec!["C1", "P"]);
    }

    #[test]
    fn test_replace_respects_mode() {
        let mut tracker: SelectionTracker<Value> = SelectionTracker::new();
        let entries = vec![
            (RowKey::from("a"), json!({"id": "a"})),
            (RowKey::from("b"), json!({"id": "b"})),
        ];
        tracker.replace(entries.clone(), SelectionMode::Single);
        assert_eq!(tracker.len(), 1);
        tracker.replace(entries.clone(), SelectionMode::Multiple);
        assert_eq!(tracker.len(), 2);
        tracker.replace(entries, SelectionMode::None);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_reconcile_prunes_and_refreshes() {
        let mut tracker: SelectionTracker<Value> = SelectionTracker::new();
        tracker.replace(
            vec![
                (RowKey::from("a"), json!({"id": "a", "v": 1})),
                (RowKey::from("b"), json!({"id": "b"})),
            ],
            SelectionMode::Multiple,
        );
        let pruned = tracker.reconcile(|key| (key.as_str() == "a").then(|| json!({"id": "a", "v": 2})));
        assert!(pruned);
        assert_eq!(keys(&tracker), vec!["a"]);
        assert_eq!(tracker.selected_values(), vec![json!({"id": "a", "v": 2})]);
        assert!(!tracker.reconcile(|_| Some(json!({"id": "a"}))));
    }
}
