//! Per-cell passability and traversal cost.
//!
//! [`MoveMask`] is a bit set of movement classes. A [`TerrainModel`] stores,
//! for every cell, the classes allowed to enter it and the scalar cost of
//! entering it. The model is plain data: producers fill it once per map
//! (or whenever the map changes) and searches only read it.

use std::fmt;
use std::ops::{BitAnd, BitOr};

use crate::dims::Dims;
use crate::geom::Point;

/// A set of movement classes, one bit per class.
///
/// On a cell it lists the classes that may enter; as a query it lists the
/// classes a traveller needs. A traveller enters a cell when every bit it
/// needs is present on the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveMask(pub u32);

impl MoveMask {
    /// No class at all. As a cell mask it blocks every traveller that needs
    /// at least one bit.
    pub const NONE: Self = Self(0);
    /// Every class.
    pub const ALL: Self = Self(u32::MAX);

    /// Mask with only bit `class` set.
    pub const fn class(class: u32) -> Self {
        Self(1 << class)
    }

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `needed` is set in `self`.
    #[inline]
    pub const fn allows(self, needed: MoveMask) -> bool {
        self.0 & needed.0 == needed.0
    }
}

impl BitOr for MoveMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for MoveMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Game-side source of terrain facts, queried once per cell by
/// [`TerrainModel::sample`].
pub trait TerrainSource {
    /// Movement classes allowed to enter `p`.
    fn mask(&self, p: Point) -> MoveMask;
    /// Cost of entering `p`. Must be ≥ 1.0 for searches to stay optimal.
    fn cost(&self, p: Point) -> f32;
}

/// Errors building a [`TerrainModel`] from raw arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum TerrainError {
    /// An array does not hold exactly one entry per cell.
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch {
                what,
                expected,
                found,
            } => write!(f, "terrain: {what} has {found} entries, expected {expected}"),
        }
    }
}

impl std::error::Error for TerrainError {}

/// Flat, row-major passability and cost arrays for a `width × height` grid.
///
/// Costs below 1.0 are not rejected here but break the optimality of
/// directed searches; costs ≤ 0 can make a search loop forever.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TerrainModel {
    dims: Dims,
    masks: Vec<MoveMask>,
    costs: Vec<f32>,
}

impl TerrainModel {
    /// A fully open grid: every class may enter every cell at cost 1.0.
    pub fn new(width: usize, height: usize) -> Self {
        let dims = Dims::new(width, height);
        Self {
            dims,
            masks: vec![MoveMask::ALL; dims.len()],
            costs: vec![1.0; dims.len()],
        }
    }

    /// Wrap existing arrays. Both must hold exactly `width * height` entries.
    pub fn from_parts(
        width: usize,
        height: usize,
        masks: Vec<MoveMask>,
        costs: Vec<f32>,
    ) -> Result<Self, TerrainError> {
        let dims = Dims::new(width, height);
        if masks.len() != dims.len() {
            return Err(TerrainError::LengthMismatch {
                what: "passability mask",
                expected: dims.len(),
                found: masks.len(),
            });
        }
        if costs.len() != dims.len() {
            return Err(TerrainError::LengthMismatch {
                what: "cost array",
                expected: dims.len(),
                found: costs.len(),
            });
        }
        Ok(Self { dims, masks, costs })
    }

    /// Build a model by querying `source` once per cell.
    pub fn sample(width: usize, height: usize, source: &impl TerrainSource) -> Self {
        let dims = Dims::new(width, height);
        let mut masks = Vec::with_capacity(dims.len());
        let mut costs = Vec::with_capacity(dims.len());
        for p in dims.range() {
            masks.push(source.mask(p));
            costs.push(source.cost(p));
        }
        Self { dims, masks, costs }
    }

    /// Grid dimensions.
    #[inline]
    pub fn dims(&self) -> Dims {
        self.dims
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.dims.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.dims.height
    }

    /// Passability of cell `idx`.
    #[inline]
    pub fn mask(&self, idx: usize) -> MoveMask {
        self.masks[idx]
    }

    /// Cost of entering cell `idx`.
    #[inline]
    pub fn cost(&self, idx: usize) -> f32 {
        self.costs[idx]
    }

    /// Whether a traveller needing `movement` may enter cell `idx`.
    #[inline]
    pub fn can_enter(&self, idx: usize, movement: MoveMask) -> bool {
        self.masks[idx].allows(movement)
    }

    /// The passability array.
    pub fn masks(&self) -> &[MoveMask] {
        &self.masks
    }

    /// The cost array.
    pub fn costs(&self) -> &[f32] {
        &self.costs
    }

    /// Set the passability of `p`. Out-of-grid points are ignored.
    pub fn set_mask(&mut self, p: Point, mask: MoveMask) {
        if let Some(i) = self.dims.index(p) {
            self.masks[i] = mask;
        }
    }

    /// Set the cost of `p`. Out-of-grid points are ignored.
    pub fn set_cost(&mut self, p: Point, cost: f32) {
        if let Some(i) = self.dims.index(p) {
            self.costs[i] = cost;
        }
    }

    /// Make every border cell impassable to every class.
    pub fn block_border(&mut self) {
        for i in 0..self.dims.len() {
            if self.dims.is_border(i) {
                self.masks[i] = MoveMask::NONE;
            }
        }
    }
}
