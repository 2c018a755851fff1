//! Domain logic modules for the table body engine.
//!
//! This module contains the pure computations of a recomputation pass:
//! - Flattening (row forest to linear sequence, honoring expansion)
//! - Window computation (which indices to materialize)
//! - Edge tracking (boundary notifications, row-set change classification)

pub mod edges;
pub mod flatten;
pub mod window;
