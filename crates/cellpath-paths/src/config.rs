//! Engine configuration.

use cellpath_core::Dims;

use crate::error::ConfigError;

/// Default number of runs between full node-pool resets.
///
/// Every run stamps the nodes it touches with a fresh epoch. When the
/// counter would pass the limit, every node is rewritten once and counting
/// restarts at 1.
pub const DEFAULT_EPOCH_LIMIT: u32 = u32::MAX - 1;

/// Largest node pool addressable with the engine's 32-bit node links.
pub const MAX_CAPACITY: usize = (u32::MAX - 1) as usize;

/// Sizing and limits for a [`Pather`](crate::Pather).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatherConfig {
    /// Grid width in cells.
    pub width: usize,
    /// Grid height in cells.
    pub height: usize,
    /// Number of search nodes allocated up front. Later terrains may use a
    /// different shape as long as they fit.
    pub capacity: usize,
    /// Runs between full node-pool resets.
    pub epoch_limit: u32,
    /// Maximum nodes popped per run, `None` for unbounded.
    pub expansion_budget: Option<u32>,
}

impl PatherConfig {
    /// Configuration for a `width × height` grid with a pool of exactly
    /// `width * height` nodes.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            capacity: width * height,
            epoch_limit: DEFAULT_EPOCH_LIMIT,
            expansion_budget: None,
        }
    }

    /// Set the node pool capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the number of runs between full resets.
    pub fn with_epoch_limit(mut self, limit: u32) -> Self {
        self.epoch_limit = limit;
        self
    }

    /// Cap the number of nodes popped per run.
    pub fn with_expansion_budget(mut self, budget: u32) -> Self {
        self.expansion_budget = Some(budget);
        self
    }

    /// Grid dimensions.
    pub fn dims(&self) -> Dims {
        Dims::new(self.width, self.height)
    }

    /// Check that the configuration describes a searchable grid that fits
    /// the node pool.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fits(self.dims(), self.capacity)?;
        if self.epoch_limit == 0 {
            return Err(ConfigError::InvalidEpochLimit);
        }
        Ok(())
    }
}

/// Shared by configuration and terrain installation.
pub(crate) fn check_fits(dims: Dims, capacity: usize) -> Result<(), ConfigError> {
    if capacity > MAX_CAPACITY {
        return Err(ConfigError::CapacityTooLarge {
            capacity,
            max: MAX_CAPACITY,
        });
    }
    if !dims.has_interior() {
        return Err(ConfigError::GridTooSmall {
            width: dims.width,
            height: dims.height,
        });
    }
    if dims.len() > capacity {
        return Err(ConfigError::CapacityExceeded {
            cells: dims.len(),
            capacity,
        });
    }
    Ok(())
}
