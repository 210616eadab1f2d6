//! The installed terrain as seen by the search loop.

use std::sync::Arc;

use cellpath_core::{Dims, MoveMask, TerrainModel};

use crate::config::check_fits;
use crate::error::ConfigError;
use crate::neighbors::Offsets;

/// A terrain snapshot bound to one movement class.
pub(crate) struct TerrainBinding {
    terrain: Arc<TerrainModel>,
    movement: MoveMask,
    offsets: Offsets,
}

impl TerrainBinding {
    /// Bind `terrain` for a pool of `capacity` nodes.
    pub(crate) fn new(
        terrain: Arc<TerrainModel>,
        movement: MoveMask,
        capacity: usize,
    ) -> Result<Self, ConfigError> {
        let dims = terrain.dims();
        check_fits(dims, capacity)?;
        Ok(Self {
            offsets: Offsets::new(dims),
            terrain,
            movement,
        })
    }

    #[inline]
    pub(crate) fn dims(&self) -> Dims {
        self.terrain.dims()
    }

    #[inline]
    pub(crate) fn movement(&self) -> MoveMask {
        self.movement
    }

    pub(crate) fn set_movement(&mut self, movement: MoveMask) {
        self.movement = movement;
    }

    #[inline]
    pub(crate) fn terrain(&self) -> &Arc<TerrainModel> {
        &self.terrain
    }

    #[inline]
    pub(crate) fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    /// Whether the bound movement class may enter `idx`.
    #[inline]
    pub(crate) fn enterable(&self, idx: usize) -> bool {
        self.terrain.can_enter(idx, self.movement)
    }

    #[inline]
    pub(crate) fn cost(&self, idx: usize) -> f32 {
        self.terrain.cost(idx)
    }
}
