//! Render records handed to the row renderer.
//!
//! One [`RenderedRow`] is produced per materialized row. It carries the row
//! value, derived per-row state, resolved cells and pre-bound actions that
//! turn renderer interactions into [`BodyInput`]s.

use serde_json::Value;

use crate::body::events::BodyInput;
use crate::config::SelectionSource;
use crate::state::SelectionMode;
use crate::traits::RowKey;

/// Derived per-row state.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMeta {
    pub key: RowKey,
    /// Position in the flattened sequence.
    pub index: usize,
    pub depth: usize,
    pub parent_index: Option<usize>,
    pub has_children: bool,
    pub is_expanded: bool,
    /// Whether the row's expansion can be toggled.
    pub can_collapse: bool,
    pub is_selected: bool,
    pub is_first: bool,
    pub is_last: bool,
    /// Top offset inside the scroll content, in pixels.
    pub offset: f64,
    /// Current (measured or estimated) height, in pixels.
    pub height: f64,
}

/// One cell: the value at a column's value path.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub column_index: usize,
    pub value_path: String,
    pub value: Option<Value>,
}

/// Actions pre-bound to one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowActions {
    key: RowKey,
}

impl RowActions {
    pub(crate) fn new(key: RowKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &RowKey {
        &self.key
    }

    pub fn toggle_selection<R>(&self, source: SelectionSource) -> BodyInput<R> {
        BodyInput::ToggleSelection { key: self.key.clone(), source }
    }

    pub fn toggle_expansion<R>(&self) -> BodyInput<R> {
        BodyInput::ToggleExpansion { key: self.key.clone() }
    }

    pub fn measured<R>(&self, height: f64) -> BodyInput<R> {
        BodyInput::RowMeasured { key: self.key.clone(), height }
    }
}

/// Everything the row renderer needs to draw one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow<'a, R> {
    pub row_value: &'a R,
    pub row_meta: RowMeta,
    pub cells: Vec<Cell>,
    pub row_selection_mode: SelectionMode,
    pub checkbox_selection_mode: SelectionMode,
    /// Whether clicking the row toggles its selection.
    pub row_toggle_mode: bool,
    /// Length of the flattened sequence.
    pub rows_count: usize,
    pub table_meta: Option<&'a Value>,
    pub actions: RowActions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_bind_key() {
        let actions = RowActions::new(RowKey::from("r1"));
        let input: BodyInput<Value> = actions.toggle_selection(SelectionSource::Checkbox);
        assert_eq!(
            input,
            BodyInput::ToggleSelection { key: RowKey::from("r1"), source: SelectionSource::Checkbox }
        );
        let input: BodyInput<Value> = actions.toggle_expansion();
        assert_eq!(input, BodyInput::ToggleExpansion { key: RowKey::from("r1") });
        let input: BodyInput<Value> = actions.measured(31.0);
        assert_eq!(input, BodyInput::RowMeasured { key: RowKey::from("r1"), height: 31.0 });
    }
}
