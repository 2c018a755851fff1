//! State management modules for the table body.
//!
//! This module contains state-only logic:
//! - Expansion state (which rows are expanded)
//! - Selection state (selected rows, mode rules, propagation)
//! - Scroll state (scroll offset, container height)

mod selection;
mod tree_state;
mod viewport;

pub use selection::{SelectionMatcher, SelectionMode, SelectionTracker, SelectionValue};
pub use tree_state::ExpansionState;
pub use viewport::ScrollState;
