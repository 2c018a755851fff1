//! Viewport window computation.
//!
//! Given scroll position, container height and row heights, decides which
//! contiguous index range of the flattened sequence must be materialized.
//! Uniform heights use integer division; measured heights use a binary
//! search over prefix sums of row bottoms.

/// Contiguous, inclusive index range of materialized rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportWindow {
    pub start_index: usize,
    pub end_index: usize,
    pub buffer_size: usize,
}

impl ViewportWindow {
    /// Window spanning a whole sequence of `len` rows (`None` when empty).
    pub fn full(len: usize) -> Option<Self> {
        (len > 0).then(|| ViewportWindow { start_index: 0, end_index: len - 1, buffer_size: 0 })
    }

    /// Number of rows inside the window.
    pub fn len(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index <= self.end_index
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start_index..=self.end_index
    }
}

/// Row height information for one window computation.
#[derive(Debug, Clone, Copy)]
pub enum RowHeights<'a> {
    /// Every row is exactly this tall.
    Uniform(f64),
    /// Cumulative bottom edge of each row (`bottoms[i]` = sum of heights 0..=i).
    Measured(&'a [f64]),
}

impl RowHeights<'_> {
    /// Top offset of row `index`.
    pub fn offset_of(&self, index: usize) -> f64 {
        match self {
            RowHeights::Uniform(height) => index as f64 * height,
            RowHeights::Measured(bottoms) => {
                if index == 0 {
                    0.0
                } else {
                    bottoms.get(index - 1).or(bottoms.last()).copied().unwrap_or(0.0)
                }
            }
        }
    }

    /// Total height of a sequence of `len` rows.
    pub fn total(&self, len: usize) -> f64 {
        self.offset_of(len)
    }
}

/// Inputs of a window computation.
#[derive(Debug, Clone, Copy)]
pub struct WindowRequest<'a> {
    pub scroll_top: f64,
    pub container_height: f64,
    pub heights: RowHeights<'a>,
    pub len: usize,
    pub buffer_size: usize,
}

/// Computes the materialized window. `None` when the sequence is empty.
///
/// The result always satisfies `0 <= start <= end < len`.
pub fn compute_window(request: &WindowRequest<'_>) -> Option<ViewportWindow> {
    if request.len == 0 {
        return None;
    }
    let top = sanitize(request.scroll_top);
    let bottom = top + sanitize(request.container_height);

    let (first, last) = match request.heights {
        RowHeights::Uniform(height) => uniform_bounds(top, bottom, height),
        RowHeights::Measured(bottoms) => {
            debug_assert_eq!(bottoms.len(), request.len, "prefix sums out of sync with rows");
            measured_bounds(top, bottom, bottoms)
        }
    };

    Some(extend(first, last, request.buffer_size, request.len))
}

/// First and last row intersecting `[top, bottom)` with uniform heights.
fn uniform_bounds(top: f64, bottom: f64, height: f64) -> (usize, usize) {
    debug_assert!(height > 0.0, "row height must be positive");
    let first = (top / height).floor() as usize;
    let last = ((bottom / height).ceil() as usize).saturating_sub(1);
    (first, last.max(first))
}

/// First and last row intersecting `[top, bottom)` from prefix sums.
fn measured_bounds(top: f64, bottom: f64, bottoms: &[f64]) -> (usize, usize) {
    let first = bottoms.partition_point(|&b| b <= top);
    let last = bottoms.partition_point(|&b| b < bottom);
    (first, last.max(first))
}

/// Extends by the buffer on both sides and clamps to `[0, len-1]`.
fn extend(first: usize, last: usize, buffer_size: usize, len: usize) -> ViewportWindow {
    let max_index = len - 1;
    let first = first.min(max_index);
    let last = last.min(max_index);
    ViewportWindow {
        start_index: first.saturating_sub(buffer_size),
        end_index: last.saturating_add(buffer_size).min(max_index),
        buffer_size,
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(scroll_top: f64, container_height: f64, len: usize, buffer_size: usize) -> Option<ViewportWindow> {
        compute_window(&WindowRequest {
            scroll_top,
            container_height,
            heights: RowHeights::Uniform(20.0),
            len,
            buffer_size,
        })
    }

    #[test]
    fn test_uniform_window_at_top() {
        let w = uniform(0.0, 40.0, 3, 0).unwrap();
        assert_eq!((w.start_index, w.end_index), (0, 1));
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn test_uniform_window_partial_rows() {
        // rows 2..=4 intersect [50, 95)
        let w = uniform(50.0, 45.0, 100, 0).unwrap();
        assert_eq!((w.start_index, w.end_index), (2, 4));
    }

    #[test]
    fn test_buffer_is_clamped() {
        let w = uniform(0.0, 40.0, 3, 5).unwrap();
        assert_eq!((w.start_index, w.end_index), (0, 2));

        let w = uniform(200.0, 40.0, 100, 3).unwrap();
        assert_eq!((w.start_index, w.end_index), (7, 14));
    }

    #[test]
    fn test_scrolled_past_end_clamps() {
        let w = uniform(10_000.0, 40.0, 5, 1).unwrap();
        assert_eq!((w.start_index, w.end_index), (3, 4));
    }

    #[test]
    fn test_zero_height_container() {
        let w = uniform(40.0, 0.0, 10, 0).unwrap();
        assert_eq!((w.start_index, w.end_index), (2, 2));
    }

    #[test]
    fn test_negative_and_nan_scroll() {
        let w = uniform(-30.0, 40.0, 10, 0).unwrap();
        assert_eq!(w.start_index, 0);
        let w = uniform(f64::NAN, 40.0, 10, 0).unwrap();
        assert_eq!(w.start_index, 0);
    }

    #[test]
    fn test_empty_sequence_has_no_window() {
        assert!(uniform(0.0, 40.0, 0, 2).is_none());
        assert!(ViewportWindow::full(0).is_none());
    }

    #[test]
    fn test_measured_window() {
        // heights 10, 50, 10, 30, 20
        let bottoms = [10.0, 60.0, 70.0, 100.0, 120.0];
        let w = compute_window(&WindowRequest {
            scroll_top: 65.0,
            container_height: 30.0,
            heights: RowHeights::Measured(&bottoms),
            len: bottoms.len(),
            buffer_size: 0,
        })
        .unwrap();
        assert_eq!((w.start_index, w.end_index), (2, 3));

        let w = compute_window(&WindowRequest {
            scroll_top: 10.0,
            container_height: 5.0,
            heights: RowHeights::Measured(&bottoms),
            len: bottoms.len(),
            buffer_size: 1,
        })
        .unwrap();
        assert_eq!((w.start_index, w.end_index), (0, 2));
    }

    #[test]
    fn test_offsets() {
        let bottoms = [10.0, 60.0, 70.0];
        let heights = RowHeights::Measured(&bottoms);
        assert_eq!(heights.offset_of(0), 0.0);
        assert_eq!(heights.offset_of(2), 60.0);
        assert_eq!(heights.total(3), 70.0);
        assert_eq!(RowHeights::Uniform(20.0).total(4), 80.0);
    }

    #[test]
    fn test_full_window() {
        let w = ViewportWindow::full(4).unwrap();
        assert_eq!((w.start_index, w.end_index), (0, 3));
        assert!(w.contains(3));
        assert!(!w.contains(4));
    }
}
