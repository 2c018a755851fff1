//! Virtualized, selectable, hierarchical row engine for table bodies.
//!
//! The crate is UI-agnostic. A host supplies rows, scroll signals, measured
//! row heights and user actions as [`BodyInput`]s; the [`BodyController`]
//! answers with the rows to materialize ([`RenderedRow`]) and emits
//! [`BodyEvent`]s for boundary changes and selection updates.
//!
//! The crate is organized as:
//! - `traits` - row value access and row identity
//! - `config` - tagged configuration variants
//! - `domain` - flattening, window computation, edge tracking
//! - `state` - expansion, selection and scroll state
//! - `cache` - measured row heights and prefix sums
//! - `body` - the controller and its render records
//! - `io` - loading and generating row data

pub mod body;
pub mod cache;
pub mod config;
pub mod domain;
pub mod io;
pub mod state;
pub mod traits;

// Export traits
pub use traits::{KeyAccessor, RowKey, RowValue, CHILDREN_ATTR};

// Export configuration
pub use config::{BodyConfig, SelectionConfig, SelectionSource, TreeConfig, VirtualizationConfig};

// Export engine components
pub use domain::edges::{EdgeKind, EdgeSignal, EdgeTracker, RowSetChange};
pub use domain::flatten::{flatten, FlatRow, FlatRows};
pub use domain::window::{compute_window, RowHeights, ViewportWindow, WindowRequest};
pub use state::{SelectionMatcher, SelectionMode, SelectionTracker, SelectionValue};

// Export controller
pub use body::{BodyController, BodyEvent, BodyInput, BodyListener, Cell, InputQueue, RenderedRow, RowActions, RowMeta};

// Export row data helpers
pub use io::{load_rows_from_file, load_rows_from_str, RowGenerator};
