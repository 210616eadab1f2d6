//! Grid dimensions and the cell index ⇄ [`Point`] mapping.
//!
//! Cells are numbered row-major: `index = y * width + x`.

use crate::geom::{Point, Range};

/// Width and height of a cell grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dims {
    pub width: usize,
    pub height: usize,
}

impl Dims {
    /// Create new dimensions.
    #[inline]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of cells.
    #[inline]
    pub const fn len(self) -> usize {
        self.width * self.height
    }

    /// Whether the grid has no cells.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Whether the grid has at least one cell that is not on the border.
    #[inline]
    pub const fn has_interior(self) -> bool {
        self.width >= 3 && self.height >= 3
    }

    /// The whole grid as a [`Range`] anchored at the origin.
    #[inline]
    pub fn range(self) -> Range {
        Range::new(0, 0, self.width as i32, self.height as i32)
    }

    /// The grid minus its one-cell border.
    #[inline]
    pub fn interior(self) -> Range {
        self.range().shrink(1)
    }

    /// Linear index of `p`, or `None` if outside the grid.
    #[inline]
    pub fn index(self, p: Point) -> Option<usize> {
        if !self.range().contains(p) {
            return None;
        }
        Some(p.y as usize * self.width + p.x as usize)
    }

    /// Grid position of linear index `idx`.
    #[inline]
    pub fn point(self, idx: usize) -> Point {
        Point::new((idx % self.width) as i32, (idx / self.width) as i32)
    }

    /// Whether `idx` lies in the first/last row or column.
    #[inline]
    pub fn is_border(self, idx: usize) -> bool {
        let x = idx % self.width;
        let y = idx / self.width;
        x == 0 || y == 0 || x + 1 >= self.width || y + 1 >= self.height
    }

    /// Move `p` onto the nearest interior cell and return its index.
    ///
    /// Border coordinates move one cell inward; coordinates outside the grid
    /// are pulled onto the interior as well. Requires [`has_interior`](Self::has_interior).
    #[inline]
    pub fn clamp_interior(self, p: Point) -> usize {
        debug_assert!(self.has_interior());
        let x = p.x.clamp(1, self.width as i32 - 2) as usize;
        let y = p.y.clamp(1, self.height as i32 - 2) as usize;
        y * self.width + x
    }

    /// Index flavour of [`clamp_interior`](Self::clamp_interior).
    #[inline]
    pub fn clamp_index(self, idx: usize) -> usize {
        let x = (idx % self.width) as i32;
        let y = (idx / self.width) as i32;
        self.clamp_interior(Point::new(x, y))
    }
}
