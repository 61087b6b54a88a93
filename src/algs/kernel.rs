//! The 3×3 weighted stencil kernel.
//!
//! Output is a pure function of the source tile, its halo ring and the
//! filter: integer accumulation, round-to-nearest normalization, clamp to
//! 0..=255. Channels never mix; an RGB tile is three independent stencils
//! over interleaved bytes.

use crate::data::halo::HaloRing;
use crate::data::tile::Tile;
use crate::stencil_error::StencilError;
use crate::topology::neighbors::Direction;

/// Immutable 3×3 filter with non-negative integer weights, row-major with
/// the up-left tap first (same order as [`Direction`]'s slots).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Filter3 {
    weights: [u16; 9],
    sum: u32,
}

impl Filter3 {
    /// # Errors
    /// Returns `Err(ZeroFilterWeight)` if the weights sum to zero, since
    /// normalization divides by the sum.
    pub fn new(weights: [u16; 9]) -> Result<Self, StencilError> {
        let sum: u32 = weights.iter().map(|&w| w as u32).sum();
        if sum == 0 {
            return Err(StencilError::ZeroFilterWeight);
        }
        Ok(Self { weights, sum })
    }

    /// The stock smoothing filter {1,2,1,2,4,2,1,2,1}, sum 16.
    pub fn smoothing() -> Self {
        Self {
            weights: [1, 2, 1, 2, 4, 2, 1, 2, 1],
            sum: 16,
        }
    }

    /// Weight of the tap in the given compass slot (center = the pixel
    /// itself).
    #[inline]
    pub fn weight(&self, slot: Direction) -> u32 {
        self.weights[slot.index()] as u32
    }

    #[inline]
    pub fn tap(&self, k: usize) -> u32 {
        self.weights[k] as u32
    }

    #[inline]
    pub fn sum(&self) -> u32 {
        self.sum
    }

    /// Round-to-nearest normalization with a clamp to the pixel range. With
    /// non-negative weights the quotient cannot exceed 255, but arbitrary
    /// filters keep the clamp as a guard against wrapping at bright edges.
    #[inline]
    fn normalize(&self, acc: u32) -> u8 {
        ((acc + self.sum / 2) / self.sum).min(255) as u8
    }
}

/// Apply `filter` to every pixel of `src`, border pixels included, writing
/// into `dst`.
///
/// Border pixels read their missing taps from the halo ring, which must hold
/// this pass's exchanged segments. `src` and `dst` must be distinct buffers
/// of identical geometry; the controller never aliases them.
///
/// # Errors
/// `DimsMismatch` / `HaloDimsMismatch` when the three buffers disagree.
pub fn apply_filter(
    src: &Tile,
    halo: &HaloRing,
    filter: &Filter3,
    dst: &mut Tile,
) -> Result<(), StencilError> {
    let dims = src.dims();
    if dst.dims() != dims {
        return Err(StencilError::DimsMismatch {
            src: dims,
            dst: dst.dims(),
        });
    }
    if halo.dims() != dims {
        return Err(StencilError::HaloDimsMismatch {
            halo: halo.dims(),
            tile: dims,
        });
    }
    let (w, h, c) = (dims.width, dims.height, dims.channels);
    let sbuf = src.as_bytes();

    // Interior: all nine taps are inside the tile, no halo lookups.
    for row in 1..h.saturating_sub(1) {
        for col in 1..w - 1 {
            for ch in 0..c {
                let mut acc = 0u32;
                let mut k = 0;
                for dr in 0..3 {
                    let base = dims.offset(row + dr - 1, col - 1) + ch;
                    for dc in 0..3 {
                        acc += filter.tap(k) * sbuf[base + dc * c] as u32;
                        k += 1;
                    }
                }
                dst.set_px(row, col, ch, filter.normalize(acc));
            }
        }
    }

    // Border: taps outside the tile come from the halo ring. Degenerate
    // tiles (width or height < 3) take this path for every pixel.
    let fetch = |r: isize, col: isize, ch: usize| -> u8 {
        if r >= 0 && r < h as isize && col >= 0 && col < w as isize {
            sbuf[dims.offset(r as usize, col as usize) + ch]
        } else {
            halo.fetch(r, col, ch)
        }
    };
    for row in 0..h {
        for col in 0..w {
            let on_border = row == 0 || row == h - 1 || col == 0 || col == w - 1;
            if !on_border {
                continue;
            }
            for ch in 0..c {
                let mut acc = 0u32;
                let mut k = 0;
                for dr in -1isize..=1 {
                    for dc in -1isize..=1 {
                        acc += filter.tap(k)
                            * fetch(row as isize + dr, col as isize + dc, ch) as u32;
                        k += 1;
                    }
                }
                dst.set_px(row, col, ch, filter.normalize(acc));
            }
        }
    }
    Ok(())
}
