//! Body controller.
//!
//! Orchestrates one recomputation pass per input: flatten, compute the
//! window, observe edges, then prune selection. Events produced by a pass are
//! returned and delivered to listeners synchronously; inputs that listeners
//! enqueue run after the current pass completes.

use anyhow::{Context, Result};
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, trace, warn};

use crate::body::events::{BodyEvent, BodyInput, BodyListener, InputQueue};
use crate::body::render::{Cell, RenderedRow, RowActions, RowMeta};
use crate::cache::RowHeightCache;
use crate::config::{BodyConfig, SelectionSource, TreeConfig, VirtualizationConfig};
use crate::domain::edges::{classify_change, EdgeTracker};
use crate::domain::flatten::{flatten, index_forest, FlatRows};
use crate::domain::window::{compute_window, RowHeights, ViewportWindow, WindowRequest};
use crate::state::{
    ExpansionState, ScrollState, SelectionMatcher, SelectionMode, SelectionTracker, SelectionValue,
};
use crate::traits::{KeyAccessor, RowKey, RowValue};

/// The virtualized, selectable, hierarchical row engine of a table body.
pub struct BodyController<R: RowValue = Value> {
    config: BodyConfig,
    keys: KeyAccessor,
    /// Value paths of the columns, in display order
    columns: Vec<String>,
    rows: Vec<R>,
    root_keys: Vec<RowKey>,
    /// Every row of the forest, regardless of expansion
    forest: FlatRows,
    /// Rows currently shown, honoring expansion
    flat: FlatRows,
    expansion: ExpansionState,
    selection: SelectionTracker<R>,
    scroll: ScrollState,
    heights: RowHeightCache,
    edges: EdgeTracker,
    window: Option<ViewportWindow>,
    listeners: Vec<Box<dyn BodyListener<R>>>,
    queue: InputQueue<R>,
    pass_count: u64,
}

impl<R: RowValue> BodyController<R> {
    /// Creates a controller with no rows.
    pub fn new(config: BodyConfig) -> Result<Self> {
        config.validate().context("Invalid body configuration")?;
        Ok(Self {
            keys: config.key_accessor(),
            config,
            columns: Vec::new(),
            rows: Vec::new(),
            root_keys: Vec::new(),
            forest: FlatRows::default(),
            flat: FlatRows::default(),
            expansion: ExpansionState::new(),
            selection: SelectionTracker::new(),
            scroll: ScrollState::new(),
            heights: RowHeightCache::new(),
            edges: EdgeTracker::new(),
            window: None,
            listeners: Vec::new(),
            queue: InputQueue::default(),
            pass_count: 0,
        })
    }

    /// Installs a selection matcher (`selectionMatchFunction`).
    pub fn with_matcher(mut self, matcher: impl Fn(&R, &R) -> bool + 'static) -> Self {
        self.set_matcher(Some(Rc::new(matcher)));
        self
    }

    pub fn set_matcher(&mut self, matcher: Option<SelectionMatcher<R>>) {
        self.selection.set_matcher(matcher);
    }

    /// Sets the value paths used to resolve each row's cells.
    pub fn set_columns<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) {
        self.columns = columns.into_iter().map(Into::into).collect();
    }

    /// Registers a listener for events of every subsequent pass.
    pub fn subscribe(&mut self, listener: impl BodyListener<R> + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ===== Input Handling =====

    /// Runs the pass for `input`, then any inputs enqueued by listeners.
    ///
    /// # Returns
    /// All events emitted, in order.
    pub fn dispatch(&mut self, input: BodyInput<R>) -> Vec<BodyEvent<R>> {
        self.queue.push(input);
        let mut emitted = Vec::new();
        while let Some(next) = self.queue.pop() {
            let events = self.apply(next);
            for event in &events {
                for listener in self.listeners.iter_mut() {
                    listener.on_event(event, &mut self.queue);
                }
            }
            emitted.extend(events);
        }
        emitted
    }

    fn apply(&mut self, input: BodyInput<R>) -> Vec<BodyEvent<R>> {
        match input {
            BodyInput::SetRows(rows) => self.replace_rows(rows),
            BodyInput::Scroll { scroll_top, container_height } => {
                if self.scroll.set(scroll_top, container_height) {
                    self.recompute_window()
                } else {
                    Vec::new()
                }
            }
            BodyInput::ToggleSelection { key, source } => self.toggle_selection(&key, source),
            BodyInput::ToggleExpansion { key } => {
                let expanded = !self.expansion.is_expanded(&key);
                self.set_expanded(&key, expanded)
            }
            BodyInput::SetExpanded { key, expanded } => self.set_expanded(&key, expanded),
            BodyInput::RowMeasured { key, height } => self.record_height(key, height),
            BodyInput::SetSelection(values) => {
                self.replace_selection(values);
                Vec::new()
            }
        }
    }

    fn replace_rows(&mut self, rows: Vec<R>) -> Vec<BodyEvent<R>> {
        let root_keys: Vec<RowKey> =
            rows.iter().enumerate().map(|(i, row)| self.keys.key_for(row, &[i])).collect();
        let change = classify_change(&self.root_keys, &root_keys);
        if !change.is_incremental() {
            self.edges.reset();
        }
        debug!(?change, roots = root_keys.len(), "Row set replaced");

        self.rows = rows;
        self.root_keys = root_keys;
        self.forest = index_forest(&self.rows, self.config.tree, &self.keys);
        if self.forest.malformed_count() > 0 {
            warn!(
                rows = self.forest.malformed_count(),
                "Rows with a non-sequence `children` attribute are shown as leaves"
            );
        }

        let forest = &self.forest;
        self.expansion.retain(|key| forest.contains_key(key));
        self.heights.retain(|key| forest.contains_key(key));

        let mut events = self.reflatten();

        let forest = &self.forest;
        let rows = &self.rows;
        let pruned = self
            .selection
            .reconcile(|key| forest.index_of(key).and_then(|i| forest.value(rows, i)).cloned());
        if pruned {
            debug!(remaining = self.selection.len(), "Pruned selection of removed rows");
            events.push(BodyEvent::Select(
                self.selection.value_for(self.config.selection.widest_mode()),
            ));
        }
        events
    }

    fn toggle_selection(&mut self, key: &RowKey, source: SelectionSource) -> Vec<BodyEvent<R>> {
        let mode = self.config.selection.mode_for(source);
        let Some(index) = self.flat.index_of(key) else {
            trace!(%key, "Ignoring selection toggle for a row that is not shown");
            return Vec::new();
        };
        if !self.selection.toggle(index, mode, self.propagates_selection(), &self.flat, &self.rows) {
            return Vec::new();
        }
        trace!(%key, ?mode, selected = self.selection.len(), "Selection toggled");
        vec![BodyEvent::Select(self.selection.value_for(mode))]
    }

    fn set_expanded(&mut self, key: &RowKey, expanded: bool) -> Vec<BodyEvent<R>> {
        if !self.config.tree.is_collapsible() {
            trace!(%key, "Ignoring expansion change: rows are not collapsible");
            return Vec::new();
        }
        let has_children = self
            .forest
            .index_of(key)
            .and_then(|i| self.forest.get(i))
            .is_some_and(|row| row.has_children);
        if !has_children || !self.expansion.set_expanded(key, expanded) {
            return Vec::new();
        }
        trace!(%key, expanded, "Expansion changed");
        let mut events = self.reflatten();

        // Children hidden while the parent's membership changed now show.
        let mode = self.config.selection.widest_mode();
        if expanded && mode == SelectionMode::Multiple && self.propagates_selection() {
            if let Some(index) = self.flat.index_of(key) {
                if self.selection.cover_revealed_subtree(index, &self.flat, &self.rows) {
                    debug!(%key, selected = self.selection.len(), "Revealed rows follow their parent");
                    events.push(BodyEvent::Select(self.selection.value_for(mode)));
                }
            }
        }
        events
    }

    fn propagates_selection(&self) -> bool {
        self.config.selection.children_select_parents && self.config.tree.is_tree()
    }

    fn record_height(&mut self, key: RowKey, height: f64) -> Vec<BodyEvent<R>> {
        if self.config.virtualization.uses_static_height() || !self.forest.contains_key(&key) {
            return Vec::new();
        }
        if !self.heights.record(key, height) {
            return Vec::new();
        }
        match self.config.virtualization {
            VirtualizationConfig::RenderAll => {
                self.sync_heights();
                Vec::new()
            }
            VirtualizationConfig::Windowed { .. } => self.recompute_window(),
        }
    }

    fn replace_selection(&mut self, values: Vec<R>) {
        let mut resolved = Vec::with_capacity(values.len());
        for value in &values {
            match self.resolve_value(value) {
                Some(index) => {
                    if let (Some(row), Some(row_value)) =
                        (self.forest.get(index), self.forest.value(&self.rows, index))
                    {
                        resolved.push((row.key.clone(), row_value.clone()));
                    }
                }
                None => warn!("Dropping selected value that matches no row"),
            }
        }
        self.selection.replace(resolved, self.config.selection.widest_mode());
        debug!(selected = self.selection.len(), "Selection replaced by host");
    }

    /// Finds the forest row for a host-supplied value: by key attribute,
    /// then matcher, then equality.
    fn resolve_value(&self, value: &R) -> Option<usize> {
        if let Some(key) = self.keys.attr_key(value) {
            return self.forest.index_of(&key);
        }
        (0..self.forest.len()).find(|&i| {
            self.forest.value(&self.rows, i).is_some_and(|row| {
                self.selection.matcher_matches(value, row).unwrap_or_else(|| row == value)
            })
        })
    }

    // ===== Recomputation =====

    /// Re-flattens after rows or expansion changed, then recomputes the window.
    fn reflatten(&mut self) -> Vec<BodyEvent<R>> {
        self.flat = flatten(&self.rows, self.expansion.expanded_keys(), self.config.tree, &self.keys);
        self.heights.invalidate();
        self.sync_heights();
        self.resolve_anchor();
        self.recompute_window()
    }

    /// Applies `id_for_first_item` once, on the first non-empty sequence.
    fn resolve_anchor(&mut self) {
        if self.scroll.anchor_resolved() || self.flat.is_empty() {
            return;
        }
        self.scroll.mark_anchor_resolved();
        let Some(id) = self.config.id_for_first_item.as_deref() else {
            return;
        };
        match self.flat.index_of(&RowKey::from(id)) {
            Some(index) => {
                let offset = self.row_heights().offset_of(index);
                self.scroll.set_scroll_top(offset);
                debug!(id, index, offset, "Initial scroll anchored");
            }
            None => {
                warn!(id, "id_for_first_item matches no row; starting at the top");
                self.scroll.set_scroll_top(0.0);
            }
        }
    }

    fn sync_heights(&mut self) {
        if !self.config.virtualization.uses_static_height() {
            self.heights.rebuild(&self.flat, self.config.virtualization.estimate_row_height());
        }
    }

    fn recompute_window(&mut self) -> Vec<BodyEvent<R>> {
        self.sync_heights();
        let window = match self.config.virtualization {
            VirtualizationConfig::RenderAll => ViewportWindow::full(self.flat.len()),
            VirtualizationConfig::Windowed { buffer_size, .. } => compute_window(&WindowRequest {
                scroll_top: self.scroll.scroll_top(),
                container_height: self.scroll.container_height(),
                heights: self.row_heights(),
                len: self.flat.len(),
                buffer_size,
            }),
        };
        debug_assert!(window.map_or(true, |w| w.start_index <= w.end_index && w.end_index < self.flat.len()));
        self.window = window;

        let signals = self.edges.observe(window, &self.flat);
        self.pass_count += 1;
        debug!(
            pass = self.pass_count,
            rows = self.flat.len(),
            window = ?window,
            signals = signals.len(),
            "Recomputed body window"
        );
        signals.into_iter().map(BodyEvent::Edge).collect()
    }

    fn row_heights(&self) -> RowHeights<'_> {
        if self.config.virtualization.uses_static_height() {
            RowHeights::Uniform(self.config.virtualization.estimate_row_height())
        } else {
            RowHeights::Measured(self.heights.bottoms())
        }
    }

    // ===== Queries =====

    pub fn config(&self) -> &BodyConfig {
        &self.config
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn flat_rows(&self) -> &FlatRows {
        &self.flat
    }

    /// Length of the flattened sequence.
    pub fn rows_count(&self) -> usize {
        self.flat.len()
    }

    pub fn window(&self) -> Option<ViewportWindow> {
        self.window
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll.scroll_top()
    }

    pub fn container_selector(&self) -> Option<&str> {
        self.config.container_selector.as_deref()
    }

    pub fn selection(&self) -> &SelectionTracker<R> {
        &self.selection
    }

    /// Current selection shaped for the mode of `source`.
    pub fn selection_value(&self, source: SelectionSource) -> SelectionValue<R> {
        self.selection.value_for(self.config.selection.mode_for(source))
    }

    pub fn is_selected(&self, key: &RowKey) -> bool {
        self.forest
            .index_of(key)
            .is_some_and(|i| self.selection.is_index_selected(&self.forest, &self.rows, i))
    }

    pub fn is_expanded(&self, key: &RowKey) -> bool {
        match self.config.tree {
            TreeConfig::Flat => false,
            TreeConfig::Tree { collapsible: false } => true,
            TreeConfig::Tree { collapsible: true } => self.expansion.is_expanded(key),
        }
    }

    /// Height of the whole scroll content.
    pub fn total_height(&self) -> f64 {
        self.row_heights().total(self.flat.len())
    }

    /// Spacer height above the first materialized row.
    pub fn top_padding(&self) -> f64 {
        self.window.map_or(0.0, |w| self.row_heights().offset_of(w.start_index))
    }

    /// Spacer height below the last materialized row.
    pub fn bottom_padding(&self) -> f64 {
        self.window.map_or(0.0, |w| {
            let heights = self.row_heights();
            (heights.total(self.flat.len()) - heights.offset_of(w.end_index + 1)).max(0.0)
        })
    }

    /// Keys of the shown rows between `from` and `to`, inclusive, in
    /// sequence order. Empty if either key is not shown.
    pub fn keys_between(&self, from: &RowKey, to: &RowKey) -> Vec<RowKey> {
        let (Some(a), Some(b)) = (self.flat.index_of(from), self.flat.index_of(to)) else {
            return Vec::new();
        };
        (a.min(b)..=a.max(b)).filter_map(|i| self.flat.key_at(i).cloned()).collect()
    }

    /// Render records of every materialized row.
    pub fn visible_rows(&self) -> Vec<RenderedRow<'_, R>> {
        let Some(window) = self.window else {
            return Vec::new();
        };
        let heights = self.row_heights();
        window.indices().filter_map(|i| self.rendered_row(i, &heights)).collect()
    }

    fn rendered_row(&self, index: usize, heights: &RowHeights<'_>) -> Option<RenderedRow<'_, R>> {
        let row = self.flat.get(index)?;
        let value = self.flat.value(&self.rows, index)?;
        let offset = heights.offset_of(index);
        let selection = &self.config.selection;

        let cells = self
            .columns
            .iter()
            .enumerate()
            .map(|(column_index, path)| Cell {
                column_index,
                value_path: path.clone(),
                value: value.attr(path),
            })
            .collect();

        Some(RenderedRow {
            row_value: value,
            row_meta: RowMeta {
                key: row.key.clone(),
                index,
                depth: row.depth,
                parent_index: row.parent_index,
                has_children: row.has_children,
                is_expanded: row.is_expanded,
                can_collapse: row.has_children && self.config.tree.is_collapsible(),
                is_selected: self.selection.is_selected(&row.key, value),
                is_first: index == 0,
                is_last: index + 1 == self.flat.len(),
                offset,
                height: heights.offset_of(index + 1) - offset,
            },
            cells,
            row_selection_mode: selection.row_mode,
            checkbox_selection_mode: selection.checkbox_mode,
            row_toggle_mode: selection.row_mode != SelectionMode::None,
            rows_count: self.flat.len(),
            table_meta: self.config.table_meta.as_ref(),
            actions: RowActions::new(row.key.clone()),
        })
    }
}
