//! Scroll position state management.
//!
//! This module tracks the scroll signal supplied by the host scroll
//! container: vertical offset and visible container height.

/// State related to the scroll container.
///
/// Responsibilities:
/// - Tracking vertical scroll offset
/// - Tracking visible container height
/// - Remembering whether the initial scroll anchor has been applied
#[derive(Debug, Clone, Default)]
pub struct ScrollState {
    /// Vertical scroll offset in pixels
    scroll_top: f64,
    /// Visible height of the scroll container in pixels
    container_height: f64,
    /// Whether the initial anchor (`id_for_first_item`) has been resolved
    anchor_resolved: bool,
}

impl ScrollState {
    /// Creates a scroll state at the top of an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Scroll Queries =====

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn container_height(&self) -> f64 {
        self.container_height
    }

    pub fn anchor_resolved(&self) -> bool {
        self.anchor_resolved
    }

    // ===== Scroll Mutations =====

    /// Sets the scroll signal; returns whether it changed.
    ///
    /// Negative and non-finite values are clamped to zero.
    pub fn set(&mut self, scroll_top: f64, container_height: f64) -> bool {
        let scroll_top = clamp_pixels(scroll_top);
        let container_height = clamp_pixels(container_height);
        let changed = scroll_top != self.scroll_top || container_height != self.container_height;
        self.scroll_top = scroll_top;
        self.container_height = container_height;
        changed
    }

    /// Sets only the scroll offset.
    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        self.scroll_top = clamp_pixels(scroll_top);
    }

    pub fn mark_anchor_resolved(&mut self) {
        self.anchor_resolved = true;
    }
}

fn clamp_pixels(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_change() {
        let mut state = ScrollState::new();
        assert!(state.set(10.0, 200.0));
        assert!(!state.set(10.0, 200.0));
        assert_eq!(state.scroll_top(), 10.0);
        assert_eq!(state.container_height(), 200.0);
    }

    #[test]
    fn test_invalid_values_clamp_to_zero() {
        let mut state = ScrollState::new();
        state.set(-5.0, f64::INFINITY);
        assert_eq!(state.scroll_top(), 0.0);
        assert_eq!(state.container_height(), 0.0);
    }
}
