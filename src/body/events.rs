//! Inputs consumed and events emitted by the body controller.

use std::collections::VecDeque;

use crate::config::SelectionSource;
use crate::domain::edges::EdgeSignal;
use crate::state::SelectionValue;
use crate::traits::RowKey;

/// An external input change that triggers a recomputation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyInput<R> {
    /// Replaces the row set.
    SetRows(Vec<R>),
    /// New scroll signal from the host scroll container.
    Scroll { scroll_top: f64, container_height: f64 },
    /// Selection toggle from a row click or a checkbox.
    ToggleSelection { key: RowKey, source: SelectionSource },
    /// Flips the expansion of a tree row.
    ToggleExpansion { key: RowKey },
    /// Sets the expansion of a tree row.
    SetExpanded { key: RowKey, expanded: bool },
    /// Height measured by the renderer after paint.
    RowMeasured { key: RowKey, height: f64 },
    /// Host-controlled selection replacement. Does not emit `Select`.
    SetSelection(Vec<R>),
}

/// Notification dispatched after a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyEvent<R> {
    /// Boundary notification (`firstReached`, `lastReached`,
    /// `firstVisibleChanged`, `lastVisibleChanged`).
    Edge(EdgeSignal),
    /// `onSelect` with the full resulting selection.
    Select(SelectionValue<R>),
}

/// Inputs requested while a pass is running. They run once it completes.
#[derive(Debug)]
pub struct InputQueue<R> {
    pending: VecDeque<BodyInput<R>>,
}

impl<R> Default for InputQueue<R> {
    fn default() -> Self {
        Self { pending: VecDeque::new() }
    }
}

impl<R> InputQueue<R> {
    pub fn push(&mut self, input: BodyInput<R>) {
        self.pending.push_back(input);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn pop(&mut self) -> Option<BodyInput<R>> {
        self.pending.pop_front()
    }
}

/// Receives events synchronously, in emission order.
pub trait BodyListener<R> {
    fn on_event(&mut self, event: &BodyEvent<R>, queue: &mut InputQueue<R>);
}

impl<R, F> BodyListener<R> for F
where
    F: FnMut(&BodyEvent<R>, &mut InputQueue<R>),
{
    fn on_event(&mut self, event: &BodyEvent<R>, queue: &mut InputQueue<R>) {
        self(event, queue)
    }
}
