use std::fmt;

use crate::engine::RunState;

/// Fatal setup mistakes, reported when the engine is configured or its
/// terrain installed, never in the middle of a search.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The grid holds more cells than the node pool was sized for.
    CapacityExceeded { cells: usize, capacity: usize },
    /// The node pool cannot be addressed with 32-bit node indices.
    CapacityTooLarge { capacity: usize, max: usize },
    /// Searches need at least one non-border cell, so width and height
    /// must both be at least 3.
    GridTooSmall { width: usize, height: usize },
    /// The epoch limit must allow at least one run between resets.
    InvalidEpochLimit,
    /// A search or movement change was requested before any terrain was
    /// installed.
    NoTerrain,
    /// Reconfiguration attempted while a run is in progress.
    Busy(RunState),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { cells, capacity } => {
                write!(f, "grid has {cells} cells but the node pool holds {capacity}")
            }
            Self::CapacityTooLarge { capacity, max } => {
                write!(f, "node pool capacity {capacity} exceeds the maximum of {max}")
            }
            Self::GridTooSmall { width, height } => {
                write!(f, "grid {width}x{height} has no interior cell (need at least 3x3)")
            }
            Self::InvalidEpochLimit => write!(f, "epoch limit must be at least 1"),
            Self::NoTerrain => write!(f, "no terrain installed"),
            Self::Busy(state) => write!(f, "cannot reconfigure while a run is {state}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Non-fatal search outcomes that produce no path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unsolved {
    /// Start and end are the same cell. Trivial, with cost 0.
    SameNode,
    /// No enterable route connects start to any goal.
    NoSolution,
    /// The run popped more nodes than the configured expansion budget.
    BudgetExhausted,
}

impl fmt::Display for Unsolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameNode => write!(f, "start and end are the same cell"),
            Self::NoSolution => write!(f, "no path exists"),
            Self::BudgetExhausted => write!(f, "expansion budget exhausted"),
        }
    }
}

impl std::error::Error for Unsolved {}

/// A run was requested while another one had not finished on the same
/// engine. This only happens when an earlier run unwound midway, and the
/// shared node pool can no longer be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStateError {
    Busy(RunState),
}

impl fmt::Display for RunStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy(state) => write!(f, "search run already in progress (state: {state})"),
        }
    }
}

impl std::error::Error for RunStateError {}
