//! Iteration controller: {exchange → filter} × repetitions with explicit
//! double buffering.
//!
//! The controller owns both tile buffers and swaps them after every pass, so
//! pass N always reads the complete pass N−1 result and a buffer is never
//! source and destination at once. Nothing here requires ranks to be in
//! lockstep: a rank blocks only on its own outstanding halo transfers.

use crate::algs::communicator::Communicator;
use crate::algs::exchange::{exchange_halo, verify_neighbor_geometry};
use crate::algs::kernel::{Filter3, apply_filter};
use crate::algs::wire::{GEOMETRY_TAG, HALO_TAG};
use crate::data::halo::HaloRing;
use crate::data::region::StridedRegion;
use crate::data::tile::Tile;
use crate::stencil_error::StencilError;
use crate::topology::neighbors::NeighborTable;

/// Run the full convolution pipeline on one rank's tile.
///
/// Performs the geometry handshake once, then exactly `repetitions` passes
/// of halo exchange followed by the stencil kernel, ping-ponging between two
/// owned buffers. Returns the buffer holding the final pass's output;
/// ownership transfers to the caller for collection into the full image.
///
/// `repetitions == 0` returns the input tile byte-for-byte and performs no
/// communication at all, handshake included.
///
/// # Errors
/// Any exchange failure or geometry disagreement aborts the run; there is no
/// partial-result recovery.
pub fn run_convolution<C: Communicator>(
    comm: &C,
    tile: Tile,
    repetitions: usize,
    neighbors: &NeighborTable,
    filter: &Filter3,
) -> Result<Tile, StencilError> {
    if repetitions == 0 {
        return Ok(tile);
    }
    let dims = tile.dims();
    verify_neighbor_geometry(comm, neighbors, dims, GEOMETRY_TAG)?;

    // built once; geometry is fixed for the whole run
    let region = StridedRegion::column(dims);
    let mut halo = HaloRing::for_tile(dims);

    let mut src = tile;
    let mut dst = Tile::new(dims);
    for pass in 0..repetitions {
        exchange_halo(&src, neighbors, &region, comm, HALO_TAG, &mut halo)?;
        apply_filter(&src, &halo, filter, &mut dst)?;
        std::mem::swap(&mut src, &mut dst);
        log::debug!(
            "rank {}: pass {}/{repetitions} complete",
            neighbors.center(),
            pass + 1
        );
    }
    Ok(src)
}
