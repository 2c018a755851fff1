//! I/O modules for row loading and generation.

pub mod row_generator;
pub mod row_loader;

// Re-export commonly used types
pub use row_generator::RowGenerator;
pub use row_loader::{load_rows_from_file, load_rows_from_str};
