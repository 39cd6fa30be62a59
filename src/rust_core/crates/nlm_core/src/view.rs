//! Anchored 2-D view over a single plane.
//!
//! A [`PlaneView`] pairs a borrowed plane with an anchor position and
//! addresses samples by signed `(dy, dx)` offsets from that anchor. It never
//! owns memory, and several views may alias the same plane at different
//! anchors (the similarity estimator compares a candidate view against a
//! reference view of the same source).
//!
//! Offsets are checked with `debug_assert!` in debug and test builds. In
//! release builds ndarray's own indexing still rejects out-of-range
//! positions, so a bad offset panics instead of reading past the buffer.

use ndarray::ArrayView2;

#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    plane: ArrayView2<'a, f32>,
    row: isize,
    col: isize,
}

impl<'a> PlaneView<'a> {
    /// Anchor a view at `(row, col)` of `plane`.
    pub fn new(plane: ArrayView2<'a, f32>, row: usize, col: usize) -> Self {
        Self {
            plane,
            row: row as isize,
            col: col as isize,
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.plane.nrows()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.plane.ncols()
    }

    /// Same plane, anchor shifted by `(dy, dx)`.
    #[inline]
    pub fn recenter(&self, dy: isize, dx: isize) -> Self {
        Self {
            plane: self.plane,
            row: self.row + dy,
            col: self.col + dx,
        }
    }

    #[inline]
    fn position(&self, dy: isize, dx: isize) -> Option<(usize, usize)> {
        let r = self.row + dy;
        let c = self.col + dx;
        if r < 0 || c < 0 {
            return None;
        }
        let (r, c) = (r as usize, c as usize);
        if r >= self.height() || c >= self.width() {
            return None;
        }
        Some((r, c))
    }

    /// Sample at `(anchor.row + dy, anchor.col + dx)`.
    #[inline(always)]
    pub fn at(&self, dy: isize, dx: isize) -> f32 {
        debug_assert!(
            self.position(dy, dx).is_some(),
            "offset ({}, {}) from anchor ({}, {}) is outside {}x{} plane",
            dy,
            dx,
            self.row,
            self.col,
            self.height(),
            self.width()
        );
        let r = (self.row + dy) as usize;
        let c = (self.col + dx) as usize;
        self.plane[[r, c]]
    }

    /// Sample with coordinates clamped to the plane (edge replication).
    #[inline]
    pub fn clamped_at(&self, dy: isize, dx: isize) -> f32 {
        let max_r = self.height() as isize - 1;
        let max_c = self.width() as isize - 1;
        let r = (self.row + dy).clamp(0, max_r) as usize;
        let c = (self.col + dx).clamp(0, max_c) as usize;
        self.plane[[r, c]]
    }
}
