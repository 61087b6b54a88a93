//! Startup handshake: exchange tile geometry with all 8 neighbors.
//!
//! A uniform decomposition means every rank's tile has identical dims; a
//! neighbor that disagrees would corrupt every subsequent halo segment, so
//! the mismatch is caught here, before any pixel traffic.

use crate::algs::communicator::{Communicator, Wait};
use crate::algs::wire::{CommTag, WireDims, cast_slice, cast_slice_mut};
use crate::data::tile::TileDims;
use crate::stencil_error::StencilError;
use crate::topology::neighbors::{Direction, NeighborTable};
use bytemuck::Zeroable;

/// Exchange `WireDims` with every neighbor and verify they all match `dims`.
///
/// Runs once per call to the iteration controller, not per iteration.
///
/// # Errors
/// `GeometryMismatch` for the first disagreeing neighbor, `CommError` if a
/// handshake message is lost or malformed. Either is fatal to the run.
pub fn verify_neighbor_geometry<C: Communicator>(
    comm: &C,
    neighbors: &NeighborTable,
    dims: TileDims,
    tag: CommTag,
) -> Result<(), StencilError> {
    // 1) post all receives
    let mut pending_recvs = Vec::with_capacity(Direction::NEIGHBORS.len());
    for dir in Direction::NEIGHBORS {
        let peer = neighbors.rank(dir);
        let mut wire = WireDims::zeroed();
        let h = comm.irecv(
            peer,
            tag.for_direction(dir.opposite()),
            cast_slice_mut(std::slice::from_mut(&mut wire)),
        );
        pending_recvs.push((dir, peer, h, wire));
    }

    // 2) post all sends, keeping the record alive until completion
    let local = WireDims::of(dims);
    let mut pending_sends = Vec::with_capacity(Direction::NEIGHBORS.len());
    for dir in Direction::NEIGHBORS {
        pending_sends.push(comm.isend(
            neighbors.rank(dir),
            tag.for_direction(dir),
            cast_slice(std::slice::from_ref(&local)),
        ));
    }

    // 3) wait for all receives, collect the first failure without early return
    let mut maybe_err = None;
    for (dir, peer, h, _wire) in pending_recvs {
        match h.wait() {
            Some(data) if data.len() == std::mem::size_of::<WireDims>() => {
                if maybe_err.is_none() {
                    let mut wire = WireDims::zeroed();
                    cast_slice_mut(std::slice::from_mut(&mut wire)).copy_from_slice(&data);
                    let remote = match wire.decode() {
                        Ok(remote) => remote,
                        Err(err) => {
                            maybe_err = Some(err);
                            continue;
                        }
                    };
                    if remote != dims {
                        log::warn!(
                            "rank {}: neighbor {peer} ({dir:?}) reports tile {remote:?}, local is {dims:?}",
                            neighbors.center()
                        );
                        maybe_err = Some(StencilError::GeometryMismatch {
                            neighbor: peer,
                            local: dims,
                            remote,
                        });
                    }
                }
            }
            Some(data) if maybe_err.is_none() => {
                maybe_err = Some(StencilError::CommError {
                    neighbor: peer,
                    source: format!(
                        "expected {} bytes of geometry, got {}",
                        std::mem::size_of::<WireDims>(),
                        data.len()
                    )
                    .into(),
                });
            }
            None if maybe_err.is_none() => {
                maybe_err = Some(StencilError::CommError {
                    neighbor: peer,
                    source: format!("failed to receive geometry from rank {peer}").into(),
                });
            }
            _ => {}
        }
    }

    // 4) always drain all send handles before returning
    for send in pending_sends {
        let _ = send.wait();
    }

    match maybe_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::ThreadComm;
    use crate::algs::wire::GEOMETRY_TAG;
    use crate::topology::grid::{GridCoords, ProcessGrid};
    use serial_test::serial;

    #[test]
    #[serial]
    fn self_handshake_on_single_rank_grid() {
        ThreadComm::reset_mailbox();
        let grid = ProcessGrid::new(1).unwrap();
        let table = NeighborTable::resolve(&grid, GridCoords::new(0, 0)).unwrap();
        let dims = TileDims::new(8, 8, 1).unwrap();
        let comm = ThreadComm::new(0);
        verify_neighbor_geometry(&comm, &table, dims, GEOMETRY_TAG).unwrap();
    }

    #[test]
    #[serial]
    fn mismatched_peer_detected() {
        ThreadComm::reset_mailbox();
        let grid = ProcessGrid::new(1).unwrap();
        let table = NeighborTable::resolve(&grid, GridCoords::new(0, 0)).unwrap();
        let comm = ThreadComm::new(0);
        // Pre-load one direction with a wrong geometry; the self-handshake
        // then answers the other seven and one slot disagrees.
        let bogus = WireDims::of(TileDims::new(4, 4, 1).unwrap());
        comm.isend(
            0,
            GEOMETRY_TAG.for_direction(Direction::Up),
            cast_slice(std::slice::from_ref(&bogus)),
        );
        let dims = TileDims::new(8, 8, 1).unwrap();
        let err = verify_neighbor_geometry(&comm, &table, dims, GEOMETRY_TAG);
        assert!(matches!(err, Err(StencilError::GeometryMismatch { .. })));
        ThreadComm::reset_mailbox();
    }
}
