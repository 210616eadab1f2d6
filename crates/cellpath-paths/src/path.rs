use cellpath_core::{Dims, Point};

use crate::pool::SearchNode;

/// A solved route: cell indices from start to goal, and its total cost.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    cells: Vec<usize>,
    cost: f32,
}

impl Path {
    /// Cell indices, start first, goal last. Always at least two entries.
    #[inline]
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Sum of the entry costs of every step.
    #[inline]
    pub fn cost(&self) -> f32 {
        self.cost
    }

    /// Number of waypoints including both endpoints.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`: a path holds at least its two endpoints.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// First waypoint (the clamped start cell).
    #[inline]
    pub fn start(&self) -> usize {
        self.cells[0]
    }

    /// Last waypoint (the goal that was reached).
    #[inline]
    pub fn goal(&self) -> usize {
        self.cells[self.cells.len() - 1]
    }

    /// Waypoints as grid positions.
    pub fn points(&self, dims: Dims) -> Vec<Point> {
        self.cells.iter().map(|&i| dims.point(i)).collect()
    }

    pub fn into_cells(self) -> Vec<usize> {
        self.cells
    }
}

/// A path found by a priority search, with the rank of the goal it reached
/// in the caller's ordering (0 = highest priority).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriorityPath {
    pub path: Path,
    pub rank: usize,
}

/// Follow parent links from `goal` back to the start.
///
/// The chain is counted first so the result is allocated once. Chains of
/// one or two nodes collapse to `[start, end]`.
pub(crate) fn reconstruct(nodes: &[SearchNode], goal: usize, start: usize, end: usize) -> Path {
    let cost = nodes[goal].g;

    let mut count = 1;
    let mut it = goal;
    while let Some(p) = nodes[it].parent() {
        count += 1;
        it = p;
    }

    if count < 3 {
        return Path {
            cells: vec![start, end],
            cost,
        };
    }

    let mut cells = vec![0; count];
    cells[0] = start;
    cells[count - 1] = end;
    let mut slot = count - 2;
    let mut it = nodes[goal].parent();
    while let Some(i) = it {
        let next = nodes[i].parent();
        if next.is_none() {
            break;
        }
        cells[slot] = i;
        slot -= 1;
        it = next;
    }
    Path { cells, cost }
}
