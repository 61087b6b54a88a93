//! Tile: one process's local rectangular block of the image.
//!
//! Storage is row-major with channels interleaved, matching the layout the
//! driver scatters out of the full image:
//! `byte = (row·width + col)·channels + channel`. Grey data is `channels = 1`,
//! RGB is `channels = 3`; nothing else in the crate distinguishes the two.

use crate::stencil_error::StencilError;

/// Geometry of a tile: `width × height` pixels of `channels` interleaved
/// bytes each. All three are non-zero; the channel count parameterizes every
/// stride and transfer size downstream, which is the whole of the
/// multi-channel adapter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TileDims {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl TileDims {
    /// # Errors
    /// Returns `Err(ZeroTileDim)` if any dimension is zero.
    pub fn new(width: usize, height: usize, channels: usize) -> Result<Self, StencilError> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(StencilError::ZeroTileDim);
        }
        Ok(Self {
            width,
            height,
            channels,
        })
    }

    /// Bytes per pixel row, `width · channels`. Also the row stride.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width * self.channels
    }

    /// Bytes per tile column on the wire, `height · channels`.
    #[inline]
    pub fn col_bytes(&self) -> usize {
        self.height * self.channels
    }

    /// Total buffer size in bytes.
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.width * self.height * self.channels
    }

    /// Byte offset of `(row, col, 0)`.
    #[inline]
    pub fn offset(&self, row: usize, col: usize) -> usize {
        (row * self.width + col) * self.channels
    }
}

/// Exclusively-owned pixel buffer plus its geometry.
///
/// Each process owns exactly two of these (current and next) for the
/// ping-pong iteration; tiles are never shared across processes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    dims: TileDims,
    data: Vec<u8>,
}

impl Tile {
    /// Zero-filled tile of the given geometry.
    pub fn new(dims: TileDims) -> Self {
        Self {
            dims,
            data: vec![0; dims.len_bytes()],
        }
    }

    /// Wrap a driver-supplied buffer.
    ///
    /// # Errors
    /// Returns `Err(TileLengthMismatch)` unless `data.len()` equals
    /// `width · height · channels`.
    pub fn from_bytes(dims: TileDims, data: Vec<u8>) -> Result<Self, StencilError> {
        if data.len() != dims.len_bytes() {
            return Err(StencilError::TileLengthMismatch {
                expected: dims.len_bytes(),
                found: data.len(),
            });
        }
        Ok(Self { dims, data })
    }

    #[inline]
    pub fn dims(&self) -> TileDims {
        self.dims
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Hand the buffer back to the driver for collection.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Borrow pixel row `row` (all channels, `row_bytes` long).
    #[inline]
    pub fn row(&self, row: usize) -> &[u8] {
        let start = self.dims.offset(row, 0);
        &self.data[start..start + self.dims.row_bytes()]
    }

    /// One channel byte at `(row, col, ch)`.
    #[inline]
    pub fn px(&self, row: usize, col: usize, ch: usize) -> u8 {
        self.data[self.dims.offset(row, col) + ch]
    }

    /// Set one channel byte at `(row, col, ch)`.
    #[inline]
    pub fn set_px(&mut self, row: usize, col: usize, ch: usize, v: u8) {
        let off = self.dims.offset(row, col) + ch;
        self.data[off] = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dims_rejected() {
        assert!(matches!(
            TileDims::new(0, 4, 1),
            Err(StencilError::ZeroTileDim)
        ));
        assert!(matches!(
            TileDims::new(4, 4, 0),
            Err(StencilError::ZeroTileDim)
        ));
    }

    #[test]
    fn interleaved_offsets() {
        let dims = TileDims::new(4, 3, 3).unwrap();
        assert_eq!(dims.row_bytes(), 12);
        assert_eq!(dims.col_bytes(), 9);
        assert_eq!(dims.len_bytes(), 36);
        assert_eq!(dims.offset(0, 0), 0);
        assert_eq!(dims.offset(1, 0), 12);
        assert_eq!(dims.offset(2, 3), 33);
    }

    #[test]
    fn from_bytes_checks_length() {
        let dims = TileDims::new(2, 2, 1).unwrap();
        assert!(Tile::from_bytes(dims, vec![0; 4]).is_ok());
        assert!(matches!(
            Tile::from_bytes(dims, vec![0; 5]),
            Err(StencilError::TileLengthMismatch {
                expected: 4,
                found: 5
            })
        ));
    }

    #[test]
    fn row_and_pixel_access() {
        let dims = TileDims::new(3, 2, 2).unwrap();
        let data: Vec<u8> = (0..12).collect();
        let tile = Tile::from_bytes(dims, data).unwrap();
        assert_eq!(tile.row(0), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(tile.row(1), &[6, 7, 8, 9, 10, 11]);
        assert_eq!(tile.px(1, 2, 1), 11);
    }
}
