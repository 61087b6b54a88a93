//! Shared helpers for the distributed integration tests: block
//! scatter/gather of a full image and a serial reference convolution with
//! periodic (wrap-around) boundaries.

use halo_stencil::prelude::*;
use std::sync::Arc;

/// Geometry of a full test image split over an S×S grid of equal tiles.
#[derive(Copy, Clone)]
pub struct ImageGeom {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub side: usize,
}

impl ImageGeom {
    pub fn tile_dims(&self) -> TileDims {
        TileDims::new(
            self.width / self.side,
            self.height / self.side,
            self.channels,
        )
        .expect("test geometry must divide evenly")
    }

    pub fn len_bytes(&self) -> usize {
        self.width * self.height * self.channels
    }

    fn offset(&self, row: usize, col: usize, ch: usize) -> usize {
        (row * self.width + col) * self.channels + ch
    }
}

/// Split the full image into row-major per-rank tile buffers, the way the
/// driver's scatter step would.
pub fn scatter(geom: ImageGeom, image: &[u8]) -> Vec<Vec<u8>> {
    assert_eq!(image.len(), geom.len_bytes());
    let dims = geom.tile_dims();
    let mut tiles = Vec::with_capacity(geom.side * geom.side);
    for ti in 0..geom.side {
        for tj in 0..geom.side {
            let mut tile = Vec::with_capacity(dims.len_bytes());
            for r in 0..dims.height {
                let start = geom.offset(ti * dims.height + r, tj * dims.width, 0);
                tile.extend_from_slice(&image[start..start + dims.row_bytes()]);
            }
            tiles.push(tile);
        }
    }
    tiles
}

/// Reassemble per-rank tiles into the full image.
pub fn gather(geom: ImageGeom, tiles: &[Vec<u8>]) -> Vec<u8> {
    let dims = geom.tile_dims();
    let mut image = vec![0u8; geom.len_bytes()];
    for ti in 0..geom.side {
        for tj in 0..geom.side {
            let tile = &tiles[ti * geom.side + tj];
            for r in 0..dims.height {
                let dst = geom.offset(ti * dims.height + r, tj * dims.width, 0);
                let src = r * dims.row_bytes();
                image[dst..dst + dims.row_bytes()]
                    .copy_from_slice(&tile[src..src + dims.row_bytes()]);
            }
        }
    }
    image
}

/// Serial reference: the same filter applied to the whole image with
/// periodic boundaries, repeated `reps` times.
pub fn reference_periodic(geom: ImageGeom, image: &[u8], filter: &Filter3, reps: usize) -> Vec<u8> {
    let (w, h, c) = (geom.width as isize, geom.height as isize, geom.channels);
    let mut cur = image.to_vec();
    let mut next = vec![0u8; cur.len()];
    for _ in 0..reps {
        for row in 0..h {
            for col in 0..w {
                for ch in 0..c {
                    let mut acc = 0u32;
                    let mut k = 0;
                    for dr in -1..=1isize {
                        for dc in -1..=1isize {
                            let rr = (row + dr).rem_euclid(h) as usize;
                            let cc = (col + dc).rem_euclid(w) as usize;
                            acc += filter.tap(k) * cur[geom.offset(rr, cc, ch)] as u32;
                            k += 1;
                        }
                    }
                    let v = ((acc + filter.sum() / 2) / filter.sum()).min(255) as u8;
                    next[geom.offset(row as usize, col as usize, ch)] = v;
                }
            }
        }
        std::mem::swap(&mut cur, &mut next);
    }
    cur
}

/// Run the full distributed pipeline on thread-backed ranks and gather the
/// result. Resets the mailbox first so scenarios cannot bleed into each
/// other.
pub fn run_distributed(geom: ImageGeom, image: &[u8], filter: &Filter3, reps: usize) -> Vec<u8> {
    ThreadComm::reset_mailbox();
    let grid = ProcessGrid::new(geom.side).expect("grid side");
    let dims = geom.tile_dims();
    let tiles = Arc::new(scatter(geom, image));
    let filter = filter.clone();
    let out = halo_stencil::algs::communicator::with_thread_ranks(grid.len(), move |comm| {
        let table = NeighborTable::resolve_for_rank(&grid, comm.rank()).expect("neighbor table");
        let tile = Tile::from_bytes(dims, tiles[comm.rank()].clone()).expect("tile geometry");
        run_convolution(&comm, tile, reps, &table, &filter)
            .expect("distributed run")
            .into_bytes()
    });
    gather(geom, &out)
}
