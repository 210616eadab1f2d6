use std::f32::consts::SQRT_2;

use cellpath_core::{Dims, Point};

/// Multiplier applied to a cell's cost when it is entered diagonally.
pub const DIAGONAL_WEIGHT: f32 = SQRT_2;

/// Octile distance: the cost of the cheapest 8-connected route between two
/// cells on a grid where every cell costs 1.0.
#[inline]
pub fn octile(a: Point, b: Point) -> f32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    (dx - dy).abs() as f32 + DIAGONAL_WEIGHT * dx.min(dy) as f32
}

/// Lower bound on the remaining cost from a cell to the goal.
pub(crate) trait Heuristic {
    fn estimate(&self, idx: usize) -> f32;
}

/// Dijkstra: no guidance.
pub(crate) struct Zero;

impl Heuristic for Zero {
    #[inline]
    fn estimate(&self, _idx: usize) -> f32 {
        0.0
    }
}

/// Octile distance to a fixed goal cell.
pub(crate) struct Octile {
    dims: Dims,
    goal: Point,
}

impl Octile {
    pub(crate) fn new(dims: Dims, goal: usize) -> Self {
        Self {
            dims,
            goal: dims.point(goal),
        }
    }
}

impl Heuristic for Octile {
    #[inline]
    fn estimate(&self, idx: usize) -> f32 {
        octile(self.dims.point(idx), self.goal)
    }
}

/// Octile distance to a disc: the distance to its center minus the largest
/// octile distance from the center to a cell inside it.
pub(crate) struct ToDisc {
    center: Octile,
    slack: f32,
}

impl ToDisc {
    pub(crate) fn new(dims: Dims, center: usize, radius: u32) -> Self {
        Self {
            center: Octile::new(dims, center),
            slack: DIAGONAL_WEIGHT * radius as f32,
        }
    }
}

impl Heuristic for ToDisc {
    #[inline]
    fn estimate(&self, idx: usize) -> f32 {
        (self.center.estimate(idx) - self.slack).max(0.0)
    }
}
