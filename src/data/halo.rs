//! HaloRing: the 1-pixel border borrowed from the 8 neighbors.
//!
//! The ring is exchange-scoped: every convolution pass overwrites all eight
//! segments before the kernel reads any of them, because the neighbors'
//! border pixels change every pass. The buffers themselves are allocated once
//! and reused.

use crate::data::tile::TileDims;
use crate::stencil_error::StencilError;
use crate::topology::neighbors::Direction;

/// Neighbor-owned border values for one tile: top/bottom rows, left/right
/// columns, and the four corner pixels, all channel-interleaved.
#[derive(Clone, Debug)]
pub struct HaloRing {
    dims: TileDims,
    top: Vec<u8>,
    bottom: Vec<u8>,
    left: Vec<u8>,
    right: Vec<u8>,
    // one pixel (× channels) per diagonal
    up_left: Vec<u8>,
    up_right: Vec<u8>,
    down_left: Vec<u8>,
    down_right: Vec<u8>,
}

impl HaloRing {
    /// Zero-filled ring sized for `dims`.
    pub fn for_tile(dims: TileDims) -> Self {
        Self {
            dims,
            top: vec![0; dims.row_bytes()],
            bottom: vec![0; dims.row_bytes()],
            left: vec![0; dims.col_bytes()],
            right: vec![0; dims.col_bytes()],
            up_left: vec![0; dims.channels],
            up_right: vec![0; dims.channels],
            down_left: vec![0; dims.channels],
            down_right: vec![0; dims.channels],
        }
    }

    #[inline]
    pub fn dims(&self) -> TileDims {
        self.dims
    }

    /// Expected wire size of the segment arriving from `dir`.
    ///
    /// `Center` has no segment and reports zero.
    pub fn segment_len(&self, dir: Direction) -> usize {
        match dir {
            Direction::Up | Direction::Down => self.dims.row_bytes(),
            Direction::Left | Direction::Right => self.dims.col_bytes(),
            Direction::Center => 0,
            _ => self.dims.channels,
        }
    }

    /// Borrow the segment that holds data owned by the neighbor in `dir`.
    ///
    /// The `Up` segment is the row of pixels just above this tile, `UpLeft`
    /// the single pixel above-left of it, and so on.
    pub fn segment(&self, dir: Direction) -> &[u8] {
        match dir {
            Direction::Up => &self.top,
            Direction::Down => &self.bottom,
            Direction::Left => &self.left,
            Direction::Right => &self.right,
            Direction::UpLeft => &self.up_left,
            Direction::UpRight => &self.up_right,
            Direction::DownLeft => &self.down_left,
            Direction::DownRight => &self.down_right,
            Direction::Center => &[],
        }
    }

    /// Overwrite the segment for `dir` with freshly received bytes.
    ///
    /// # Errors
    /// `RegionLengthMismatch` if `data` is not exactly the segment's size,
    /// which would indicate a peer with a different tile geometry.
    pub fn store_segment(&mut self, dir: Direction, data: &[u8]) -> Result<(), StencilError> {
        let expected = self.segment_len(dir);
        if data.len() != expected {
            return Err(StencilError::RegionLengthMismatch {
                expected,
                found: data.len(),
            });
        }
        let seg: &mut Vec<u8> = match dir {
            Direction::Up => &mut self.top,
            Direction::Down => &mut self.bottom,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
            Direction::UpLeft => &mut self.up_left,
            Direction::UpRight => &mut self.up_right,
            Direction::DownLeft => &mut self.down_left,
            Direction::DownRight => &mut self.down_right,
            Direction::Center => return Ok(()),
        };
        seg.copy_from_slice(data);
        Ok(())
    }

    /// One channel byte of the halo pixel at virtual position
    /// `(row, col)` in extended coordinates, where the tile proper occupies
    /// rows `0..height` and columns `0..width`.
    ///
    /// Exactly one of `row`/`col` out of range selects an edge segment; both
    /// out of range selects a corner. In-range positions are the caller's own
    /// tile and not answered here.
    #[inline]
    pub fn fetch(&self, row: isize, col: isize, ch: usize) -> u8 {
        let w = self.dims.width as isize;
        let h = self.dims.height as isize;
        let c = self.dims.channels;
        debug_assert!(row == -1 || row == h || col == -1 || col == w);
        if row == -1 {
            if col == -1 {
                self.up_left[ch]
            } else if col == w {
                self.up_right[ch]
            } else {
                self.top[col as usize * c + ch]
            }
        } else if row == h {
            if col == -1 {
                self.down_left[ch]
            } else if col == w {
                self.down_right[ch]
            } else {
                self.bottom[col as usize * c + ch]
            }
        } else if col == -1 {
            self.left[row as usize * c + ch]
        } else {
            self.right[row as usize * c + ch]
        }
    }
}
