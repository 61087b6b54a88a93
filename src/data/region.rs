//! StridedRegion: reusable descriptor for non-contiguous tile regions.
//!
//! Rows of a row-major tile are contiguous and move as plain slices; columns
//! are not. Instead of hand-rolled pack/unpack loops at every call site, the
//! exchange engine builds one `StridedRegion` per run describing "one column
//! of this tile" and drives every left/right transfer through its
//! gather/scatter pair, which keeps the row and column paths of the exchange
//! structurally symmetric.

use crate::data::tile::TileDims;
use crate::stencil_error::StencilError;

/// Immutable description of a strided region: `count` runs of `elem` bytes,
/// each `stride` bytes after the previous.
///
/// Built once (tile geometry is fixed for the whole run) and reused by every
/// iteration. The descriptor itself never touches pixel data; it only
/// validates and addresses it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StridedRegion {
    stride: usize,
    count: usize,
    elem: usize,
}

impl StridedRegion {
    /// Descriptor for one column of a tile: `height` runs of `channels`
    /// bytes, `width · channels` bytes apart.
    pub fn column(dims: TileDims) -> Self {
        Self {
            stride: dims.row_bytes(),
            count: dims.height,
            elem: dims.channels,
        }
    }

    /// Wire size of the region, `count · elem` bytes.
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.count * self.elem
    }

    /// Byte offset of the top of column `col` in the owning tile.
    #[inline]
    pub fn column_origin(&self, col: usize) -> usize {
        col * self.elem
    }

    /// Total span the region covers from its origin, in bytes.
    #[inline]
    fn span(&self) -> usize {
        if self.count == 0 {
            0
        } else {
            (self.count - 1) * self.stride + self.elem
        }
    }

    fn check_bounds(&self, origin: usize, buf_len: usize) -> Result<(), StencilError> {
        let span = self.span();
        if origin + span > buf_len {
            return Err(StencilError::RegionOutOfBounds {
                origin,
                span,
                buf_len,
            });
        }
        Ok(())
    }

    /// Copy the region starting at `origin` in `buf` into the contiguous
    /// wire buffer `out`.
    ///
    /// # Errors
    /// `RegionOutOfBounds` if the region does not fit in `buf`;
    /// `RegionLengthMismatch` if `out.len() != len_bytes()`.
    pub fn gather(&self, buf: &[u8], origin: usize, out: &mut [u8]) -> Result<(), StencilError> {
        if out.len() != self.len_bytes() {
            return Err(StencilError::RegionLengthMismatch {
                expected: self.len_bytes(),
                found: out.len(),
            });
        }
        self.check_bounds(origin, buf.len())?;
        for (i, chunk) in out.chunks_exact_mut(self.elem).enumerate() {
            let src = origin + i * self.stride;
            chunk.copy_from_slice(&buf[src..src + self.elem]);
        }
        Ok(())
    }

    /// Copy the contiguous wire buffer `data` into the region starting at
    /// `origin` in `buf`. Exact inverse of [`gather`](Self::gather).
    ///
    /// # Errors
    /// Same conditions as `gather`.
    pub fn scatter(&self, data: &[u8], buf: &mut [u8], origin: usize) -> Result<(), StencilError> {
        if data.len() != self.len_bytes() {
            return Err(StencilError::RegionLengthMismatch {
                expected: self.len_bytes(),
                found: data.len(),
            });
        }
        self.check_bounds(origin, buf.len())?;
        for (i, chunk) in data.chunks_exact(self.elem).enumerate() {
            let dst = origin + i * self.stride;
            buf[dst..dst + self.elem].copy_from_slice(chunk);
        }
        Ok(())
    }
}
