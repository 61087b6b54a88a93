//! Per-iteration halo exchange with the 8 grid neighbors, plus the one-time
//! geometry handshake that runs before the first iteration.

pub mod halo;
pub mod size_check;

pub use halo::exchange_halo;
pub use size_check::verify_neighbor_geometry;
