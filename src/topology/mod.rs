//! Process-grid topology: the periodic S×S arrangement of ranks and the
//! per-rank neighbor table derived from it.

pub mod grid;
pub mod neighbors;

pub use grid::{GridCoords, ProcessGrid};
pub use neighbors::{Direction, NeighborTable};
