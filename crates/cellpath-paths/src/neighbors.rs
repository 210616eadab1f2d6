use cellpath_core::{Dims, Point};

use crate::heuristic::DIAGONAL_WEIGHT;

/// One of the eight moves out of a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Step {
    /// Change of the linear cell index.
    pub(crate) delta: isize,
    pub(crate) dx: i32,
    pub(crate) dy: i32,
    /// Cost multiplier: 1 for orthogonal moves, √2 for diagonal ones.
    pub(crate) weight: f32,
}

/// The eight neighbour moves for a grid of a given width, derived once per
/// terrain installation. Orthogonal moves come first.
#[derive(Debug, Clone)]
pub(crate) struct Offsets {
    steps: [Step; 8],
}

impl Offsets {
    pub(crate) fn new(dims: Dims) -> Self {
        let w = dims.width as isize;
        let steps = Point::ZERO.neighbors_8().map(|d| {
            let diagonal = d.x != 0 && d.y != 0;
            Step {
                delta: d.y as isize * w + d.x as isize,
                dx: d.x,
                dy: d.y,
                weight: if diagonal { DIAGONAL_WEIGHT } else { 1.0 },
            }
        });
        Self { steps }
    }

    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }
}
