//! Shortest paths on weighted 8-connected grids.
//!
//! A [`Pather`] searches a [`TerrainModel`](cellpath_core::TerrainModel)
//! snapshot for one movement class at a time. Node storage is allocated once
//! and invalidated lazily with an epoch counter, so repeated searches do not
//! pay for clearing it.
//!
//! | Search | Algorithm | Stops at |
//! |---|---|---|
//! | [`Pather::find_path`] | A\* (octile heuristic) | the end cell |
//! | [`Pather::find_path_to_any`] | Dijkstra, optional cost cutoff | the cheapest goal |
//! | [`Pather::find_path_to_priority`] | Dijkstra | the highest-ranked reachable goal |
//! | [`Pather::find_path_to_radius`] | A\* (distance to disc) | any cell within the radius |
//!
//! Moving orthogonally into a cell costs its cost; moving diagonally costs
//! [`DIAGONAL_WEIGHT`] times that.

mod binding;
mod config;
mod engine;
mod error;
mod heuristic;
mod neighbors;
mod open;
mod path;
mod pool;

pub use config::{DEFAULT_EPOCH_LIMIT, MAX_CAPACITY, PatherConfig};
pub use engine::{Pather, RunState, RunStats};
pub use error::{ConfigError, RunStateError, Unsolved};
pub use heuristic::{DIAGONAL_WEIGHT, octile};
pub use path::{Path, PriorityPath};
