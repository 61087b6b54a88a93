//! # halo-stencil
//!
//! halo-stencil is a Rust library for distributed-memory 2D image
//! convolution: the image is partitioned across a periodic S×S grid of
//! cooperating processes, and each process repeatedly applies a fixed 3×3
//! weighted filter to its local tile, exchanging a 1-pixel halo with its
//! eight grid neighbors (diagonals included) before every pass.
//!
//! ## Features
//! - Periodic process-grid topology with per-rank neighbor tables
//! - Reusable strided-region descriptors for column transfers out of
//!   row-major tiles, no pack/unpack scratch passes
//! - Deadlock-free three-phase halo exchange (rows, columns, corners) over
//!   pluggable communication backends (serial no-op, in-process threads, MPI)
//! - Integer 3×3 stencil kernel with round-to-nearest normalization and
//!   clamping, channel-interleaved RGB supported through the same code path
//! - Explicit double-buffered iteration controller
//!
//! ## Determinism
//!
//! The kernel is a pure integer function of the exchanged halo and the
//! filter; given the same tiles and grid, every backend produces identical
//! bytes. Ranks need not run in lockstep — each pass only waits on its own
//! border transfers.
//!
//! ## Scope
//!
//! Scattering the full image into tiles, CLI/config parsing, pixel file I/O
//! and timing aggregation belong to the driver. The crate's boundary is a
//! populated [`Tile`](data::tile::Tile) plus a grid handle in, the filtered
//! tile out.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! halo-stencil = "0.3"
//! # features = ["mpi-support"]
//! ```

// Re-export our major subsystems:
pub mod algs;
pub mod data;
pub mod stencil_error;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, NoComm, ThreadComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::exchange::{exchange_halo, verify_neighbor_geometry};
    pub use crate::algs::iterate::run_convolution;
    pub use crate::algs::kernel::{Filter3, apply_filter};
    pub use crate::algs::wire::{CommTag, GEOMETRY_TAG, HALO_TAG};
    pub use crate::data::halo::HaloRing;
    pub use crate::data::region::StridedRegion;
    pub use crate::data::tile::{Tile, TileDims};
    pub use crate::stencil_error::StencilError;
    pub use crate::topology::grid::{GridCoords, ProcessGrid};
    pub use crate::topology::neighbors::{Direction, NeighborTable};
}
