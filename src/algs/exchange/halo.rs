//! The boundary exchange protocol: rows, then columns, then corners.
//!
//! Each phase posts every receive before any send and waits on its own
//! handles only, so no fixed send/receive order across ranks can deadlock,
//! and a rank never blocks on a neighbor's compute progress — only on that
//! neighbor's matching border message. Receive failures are collected
//! without early return and all send handles are drained before the phase
//! reports, so no request is ever leaked into the next iteration.

use crate::algs::communicator::{Communicator, Wait};
use crate::algs::wire::CommTag;
use crate::data::halo::HaloRing;
use crate::data::region::StridedRegion;
use crate::data::tile::Tile;
use crate::stencil_error::StencilError;
use crate::topology::neighbors::{Direction, NeighborTable};

/// One complete boundary exchange for one tile and one iteration.
///
/// On return the halo ring holds all eight neighbor borders for this pass:
/// the top/bottom rows, the left/right columns (moved through `region`
/// without an intermediate pack buffer on the tile side), and the four
/// corner pixels. The kernel must not run on a partially filled ring, so any
/// transfer failure aborts with `CommError` and the ring contents are
/// unspecified.
pub fn exchange_halo<C: Communicator>(
    tile: &Tile,
    neighbors: &NeighborTable,
    region: &StridedRegion,
    comm: &C,
    tag: CommTag,
    halo: &mut HaloRing,
) -> Result<(), StencilError> {
    let dims = tile.dims();
    if halo.dims() != dims {
        return Err(StencilError::HaloDimsMismatch {
            halo: halo.dims(),
            tile: dims,
        });
    }

    // Row pass: top row travels up, bottom row travels down.
    exchange_phase(
        &[Direction::Up, Direction::Down],
        tile,
        neighbors,
        region,
        comm,
        tag,
        halo,
    )?;
    // Column pass: same pattern along left/right, addressed by the strided
    // region descriptor.
    exchange_phase(
        &[Direction::Left, Direction::Right],
        tile,
        neighbors,
        region,
        comm,
        tag,
        halo,
    )?;
    // Corner pass: one pixel (× channels) with each diagonal neighbor.
    exchange_phase(
        &[
            Direction::UpLeft,
            Direction::UpRight,
            Direction::DownLeft,
            Direction::DownRight,
        ],
        tile,
        neighbors,
        region,
        comm,
        tag,
        halo,
    )?;
    log::trace!(
        "rank {}: halo exchange complete for {}x{}x{} tile",
        neighbors.center(),
        dims.width,
        dims.height,
        dims.channels
    );
    Ok(())
}

/// The border segment of `tile` that travels in `dir`, as a contiguous wire
/// buffer.
fn outgoing_border(
    tile: &Tile,
    region: &StridedRegion,
    dir: Direction,
) -> Result<Vec<u8>, StencilError> {
    let dims = tile.dims();
    let last_row = dims.height - 1;
    let last_col = dims.width - 1;
    let buf = match dir {
        Direction::Up => tile.row(0).to_vec(),
        Direction::Down => tile.row(last_row).to_vec(),
        Direction::Left | Direction::Right => {
            let col = if dir == Direction::Left { 0 } else { last_col };
            let mut wire = vec![0; region.len_bytes()];
            region.gather(tile.as_bytes(), region.column_origin(col), &mut wire)?;
            wire
        }
        Direction::UpLeft => corner(tile, 0, 0),
        Direction::UpRight => corner(tile, 0, last_col),
        Direction::DownLeft => corner(tile, last_row, 0),
        Direction::DownRight => corner(tile, last_row, last_col),
        Direction::Center => Vec::new(),
    };
    Ok(buf)
}

#[inline]
fn corner(tile: &Tile, row: usize, col: usize) -> Vec<u8> {
    let dims = tile.dims();
    let off = dims.offset(row, col);
    tile.as_bytes()[off..off + dims.channels].to_vec()
}

/// One deadlock-free exchange phase over a symmetric set of directions.
///
/// For every direction `d` in the set, this rank both sends its own `d`
/// border (tagged with `d`) and receives the segment arriving *from* `d`
/// (which the peer sent travelling `d.opposite()`, hence the tag). Peers may
/// alias under wraparound; the direction-of-travel tag keeps the streams
/// apart.
fn exchange_phase<C: Communicator>(
    dirs: &[Direction],
    tile: &Tile,
    neighbors: &NeighborTable,
    region: &StridedRegion,
    comm: &C,
    tag: CommTag,
    halo: &mut HaloRing,
) -> Result<(), StencilError> {
    // 1) post all receives (keeping each buffer alive until completion)
    let mut pending_recvs = Vec::with_capacity(dirs.len());
    for &dir in dirs {
        let peer = neighbors.rank(dir);
        let mut buf = vec![0u8; halo.segment_len(dir)];
        let h = comm.irecv(peer, tag.for_direction(dir.opposite()), &mut buf);
        pending_recvs.push((dir, peer, h, buf));
    }

    // 2) post all sends, keeping payloads alive until completion
    let mut pending_sends = Vec::with_capacity(dirs.len());
    let mut send_bufs = Vec::with_capacity(dirs.len());
    for &dir in dirs {
        let payload = outgoing_border(tile, region, dir)?;
        pending_sends.push(comm.isend(neighbors.rank(dir), tag.for_direction(dir), &payload));
        send_bufs.push(payload);
    }

    // 3) wait for all receives, collect the first failure without early return
    let mut maybe_err = None;
    for (dir, peer, h, _buf) in pending_recvs {
        match h.wait() {
            Some(data) if data.len() == halo.segment_len(dir) => {
                if maybe_err.is_none() {
                    if let Err(err) = halo.store_segment(dir, &data) {
                        maybe_err = Some(err);
                    }
                }
            }
            Some(data) if maybe_err.is_none() => {
                maybe_err = Some(StencilError::CommError {
                    neighbor: peer,
                    source: format!(
                        "expected {} halo bytes from {dir:?}, got {}",
                        halo.segment_len(dir),
                        data.len()
                    )
                    .into(),
                });
            }
            None if maybe_err.is_none() => {
                maybe_err = Some(StencilError::CommError {
                    neighbor: peer,
                    source: format!("failed to receive {dir:?} halo segment").into(),
                });
            }
            _ => {} // already have an error; just drain
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
    use crate::algs::communicator::{NoComm, ThreadComm};
    use crate::algs::wire::HALO_TAG;
    use crate::data::tile::TileDims;
    use crate::topology::grid::{GridCoords, ProcessGrid};
    use serial_test::serial;

    fn table_1x1() -> NeighborTable {
        let grid = ProcessGrid::new(1).unwrap();
        NeighborTable::resolve(&grid, GridCoords::new(0, 0)).unwrap()
    }

    #[test]
    fn outgoing_borders_have_wire_sizes() {
        let dims = TileDims::new(4, 3, 3).unwrap();
        let tile = Tile::from_bytes(dims, (0..36).collect()).unwrap();
        let region = StridedRegion::column(dims);
        for dir in Direction::NEIGHBORS {
            let wire = outgoing_border(&tile, &region, dir).unwrap();
            let expected = HaloRing::for_tile(dims).segment_len(dir);
            assert_eq!(wire.len(), expected, "{dir:?}");
        }
    }

    #[test]
    fn outgoing_borders_pick_the_right_pixels() {
        let dims = TileDims::new(3, 2, 1).unwrap();
        let tile = Tile::from_bytes(dims, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let region = StridedRegion::column(dims);
        let get = |dir| outgoing_border(&tile, &region, dir).unwrap();
        assert_eq!(get(Direction::Up), vec![1, 2, 3]);
        assert_eq!(get(Direction::Down), vec![4, 5, 6]);
        assert_eq!(get(Direction::Left), vec![1, 4]);
        assert_eq!(get(Direction::Right), vec![3, 6]);
        assert_eq!(get(Direction::UpLeft), vec![1]);
        assert_eq!(get(Direction::UpRight), vec![3]);
        assert_eq!(get(Direction::DownLeft), vec![4]);
        assert_eq!(get(Direction::DownRight), vec![6]);
    }

    #[test]
    fn mismatched_halo_rejected() {
        let dims = TileDims::new(3, 2, 1).unwrap();
        let other = TileDims::new(2, 2, 1).unwrap();
        let tile = Tile::new(dims);
        let mut halo = HaloRing::for_tile(other);
        let region = StridedRegion::column(dims);
        let err = exchange_halo(&tile, &table_1x1(), &region, &NoComm, HALO_TAG, &mut halo);
        assert!(matches!(err, Err(StencilError::HaloDimsMismatch { .. })));
    }

    #[test]
    #[serial]
    fn wrong_sized_segment_is_collected_not_propagated() {
        ThreadComm::reset_mailbox();
        let dims = TileDims::new(3, 2, 1).unwrap();
        let tile = Tile::new(dims);
        let mut halo = HaloRing::for_tile(dims);
        let region = StridedRegion::column(dims);
        let comm = ThreadComm::new(0);
        // A stale undersized message sits ahead of the real top row on the
        // S=1 self-loop; the wait loop must record the failure, keep
        // draining its remaining handles, and report CommError.
        comm.isend(0, HALO_TAG.for_direction(Direction::Up), &[7]);
        let err = exchange_halo(&tile, &table_1x1(), &region, &comm, HALO_TAG, &mut halo);
        assert!(matches!(err, Err(StencilError::CommError { .. })));
        ThreadComm::reset_mailbox();
    }

    #[test]
    fn no_comm_surfaces_comm_error() {
        let dims = TileDims::new(3, 2, 1).unwrap();
        let tile = Tile::new(dims);
        let mut halo = HaloRing::for_tile(dims);
        let region = StridedRegion::column(dims);
        let err = exchange_halo(&tile, &table_1x1(), &region, &NoComm, HALO_TAG, &mut halo);
        assert!(matches!(err, Err(StencilError::CommError { .. })));
    }
}
