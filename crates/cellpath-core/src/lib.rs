//! Grid types shared by the cellpath search engine.
//!
//! Geometry primitives, grid dimensions with the row-major cell index
//! mapping, movement-class masks, and the flat [`TerrainModel`] that
//! searches read.

pub mod dims;
pub mod geom;
pub mod terrain;

pub use dims::Dims;
pub use geom::{Point, Range};
pub use terrain::{MoveMask, TerrainError, TerrainModel, TerrainSource};
