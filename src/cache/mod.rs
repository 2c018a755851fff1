//! Caching modules for performance optimization.

pub mod height_cache;

// Re-export commonly used types
pub use height_cache::RowHeightCache;
