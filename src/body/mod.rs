//! Table body orchestration.
//!
//! - `controller` runs recomputation passes and answers render queries
//! - `events` defines inputs, notifications and listeners
//! - `render` defines the per-row records handed to the row renderer

mod controller;
mod events;
mod render;

pub use controller::BodyController;
pub use events::{BodyEvent, BodyInput, BodyListener, InputQueue};
pub use render::{Cell, RenderedRow, RowActions, RowMeta};
