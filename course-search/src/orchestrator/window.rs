//! Pagination window expansion.
//!
//! Business-score reordering happens inside tie groups. If a tie group
//! straddles a page boundary, reordering only the part inside the page would
//! let the same result show up on two pages (or none). The window is therefore
//! widened to whole tie groups, reordered, and trimmed back afterwards.

use crate::types::ScoredRef;

/// Inclusive range of refs to hydrate, plus where the requested page starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// First ref to load (inclusive).
    pub start: usize,
    /// Last ref to load (inclusive).
    pub end: usize,
    /// `min_index` as originally requested.
    pub requested_min: usize,
}

impl PageWindow {
    /// Number of loaded refs in front of the requested page.
    pub fn start_offset(&self) -> usize {
        self.requested_min - self.start
    }

    /// The requested window with `max_index` clamped, without tie expansion.
    ///
    /// Returns `None` when `min_index` is past the last ref.
    pub fn exact(len: usize, min_index: usize, max_index: usize) -> Option<Self> {
        if min_index >= len {
            return None;
        }
        Some(Self {
            start: min_index,
            end: max_index.min(len - 1),
            requested_min: min_index,
        })
    }
}

/// Widen `[min_index, max_index]` so that no tie group crosses either edge.
///
/// `refs` must be sorted by descending score. Returns `None` when `min_index`
/// is past the last ref; otherwise both bounds lie within `0..refs.len()`.
pub fn expand_window(refs: &[ScoredRef], min_index: usize, max_index: usize) -> Option<PageWindow> {
    let mut window = PageWindow::exact(refs.len(), min_index, max_index)?;

    while window.start > 0 && refs[window.start - 1].score == refs[window.start].score {
        window.start -= 1;
    }
    while window.end + 1 < refs.len() && refs[window.end + 1].score == refs[window.end].score {
        window.end += 1;
    }

    Some(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(scores: &[f64]) -> Vec<ScoredRef> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| ScoredRef::class(format!("r{i}"), *s))
            .collect()
    }

    fn assert_tie_closed(refs: &[ScoredRef], window: PageWindow) {
        if window.start > 0 {
            assert_ne!(refs[window.start - 1].score, refs[window.start].score);
        }
        if window.end + 1 < refs.len() {
            assert_ne!(refs[window.end + 1].score, refs[window.end].score);
        }
    }

    #[test]
    fn no_ties_leaves_window_alone() {
        let refs = refs(&[5.0, 4.0, 3.0, 2.0, 1.0]);
        let window = expand_window(&refs, 1, 3).expect("in range");
        assert_eq!((window.start, window.end), (1, 3));
        assert_eq!(window.start_offset(), 0);
    }

    #[test]
    fn expands_backwards_over_ties() {
        let refs = refs(&[5.0, 4.0, 4.0, 4.0, 1.0]);
        let window = expand_window(&refs, 2, 3).expect("in range");
        assert_eq!(window.start, 1);
        assert_eq!(window.start_offset(), 1);
        assert_eq!(window.requested_min, 2);
    }

    #[test]
    fn expands_forwards_over_ties() {
        let refs = refs(&[5.0, 4.0, 3.0, 3.0, 3.0, 1.0]);
        let window = expand_window(&refs, 0, 2).expect("in range");
        assert_eq!((window.start, window.end), (0, 4));
    }

    #[test]
    fn clamps_max_to_last_index() {
        let refs = refs(&[3.0, 2.0, 1.0]);
        let window = expand_window(&refs, 0, 1000).expect("in range");
        assert_eq!((window.start, window.end), (0, 2));
    }

    #[test]
    fn all_tied_expands_to_everything() {
        let refs = refs(&[1.0; 6]);
        let window = expand_window(&refs, 2, 3).expect("in range");
        assert_eq!((window.start, window.end), (0, 5));
        assert_eq!(window.end - window.start + 1, 6);
    }

    #[test]
    fn min_past_end_is_none() {
        let refs = refs(&[3.0, 2.0, 1.0]);
        assert!(expand_window(&refs, 3, 10).is_none());
        assert!(expand_window(&[], 0, 10).is_none());
    }

    #[test]
    fn window_is_a_tie_closed_superset() {
        let refs = refs(&[9.0, 7.0, 7.0, 7.0, 5.0, 5.0, 2.0, 2.0, 2.0, 1.0]);
        for min in 0..refs.len() {
            for max in (min + 1)..=(refs.len() + 2) {
                let window = expand_window(&refs, min, max).expect("in range");
                assert!(window.start <= min);
                assert!(window.end >= max.min(refs.len() - 1));
                assert!(window.end < refs.len());
                assert_tie_closed(&refs, window);
            }
        }
    }

    #[test]
    fn exact_window_does_not_expand() {
        let window = PageWindow::exact(6, 2, 3).expect("in range");
        assert_eq!((window.start, window.end), (2, 3));
        assert_eq!(window.start_offset(), 0);
        assert!(PageWindow::exact(2, 2, 3).is_none());
    }
}
