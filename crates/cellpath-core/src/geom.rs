//! Grid positions and rectangles.

use std::fmt;

/// Unit steps to the eight neighbours of a cell: W, E, S, N, then NW, NE,
/// SW, SE. Search offsets are derived from this order.
const NEIGHBOR_STEPS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, 1),
    (0, -1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// A cell position. `x` is the column, `y` the row (growing down).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Self = Self::new(0, 0);

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn in_range(self, r: &Range) -> bool {
        r.contains(self)
    }

    /// The eight surrounding cells, orthogonal ones first.
    #[inline]
    pub fn neighbors_8(self) -> [Point; 8] {
        NEIGHBOR_STEPS.map(|(dx, dy)| Self::new(self.x + dx, self.y + dy))
    }

    /// Squared Euclidean distance.
    #[inline]
    pub fn distance_sq(self, other: Point) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The cells `min.x..max.x` × `min.y..max.y`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub min: Point,
    pub max: Point,
}

impl Range {
    /// Range spanning the two corners, whichever order they come in.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let (xa, xb) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (ya, yb) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        Self {
            min: Point::new(xa, ya),
            max: Point::new(xb, yb),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Number of cells.
    pub fn len(self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.max.x - self.min.x) as usize * (self.max.y - self.min.y) as usize
        }
    }

    #[inline]
    pub fn contains(self, p: Point) -> bool {
        (self.min.x..self.max.x).contains(&p.x) && (self.min.y..self.max.y).contains(&p.y)
    }

    /// Drop `n` cells from every side. Collapses to the empty default range
    /// when nothing is left.
    pub fn shrink(self, n: i32) -> Self {
        let inner = Self {
            min: Point::new(self.min.x + n, self.min.y + n),
            max: Point::new(self.max.x - n, self.max.y - n),
        };
        if inner.is_empty() { Self::default() } else { inner }
    }

    /// Cells in row-major order.
    pub fn iter(self) -> RangeIter {
        RangeIter {
            range: self,
            next: 0,
            len: self.len(),
        }
    }
}

impl IntoIterator for Range {
    type Item = Point;
    type IntoIter = RangeIter;

    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

/// Row-major walk over a [`Range`].
#[derive(Clone, Debug)]
pub struct RangeIter {
    range: Range,
    next: usize,
    len: usize,
}

impl Iterator for RangeIter {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.next >= self.len {
            return None;
        }
        let w = (self.range.max.x - self.range.min.x) as usize;
        let p = Point::new(
            self.range.min.x + (self.next % w) as i32,
            self.range.min.y + (self.next / w) as i32,
        );
        self.next += 1;
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for RangeIter {}
