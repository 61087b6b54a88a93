//! Tile storage and the strided access descriptors used to move
//! non-contiguous tile regions over the wire.

pub mod halo;
pub mod region;
pub mod tile;

pub use halo::HaloRing;
pub use region::StridedRegion;
pub use tile::{Tile, TileDims};
