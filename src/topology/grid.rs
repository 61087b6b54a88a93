//! Periodic S×S process grid.
//!
//! The grid is the run-wide, immutable arrangement of `S²` ranks into a
//! square with wraparound edges: row −1 is row S−1, column S is column 0.
//! It is built once at startup (typically from the communicator's world
//! size) and consumed read-only by every other component.

use crate::stencil_error::StencilError;

/// (row, col) position of a rank inside the periodic grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct GridCoords {
    pub row: usize,
    pub col: usize,
}

impl GridCoords {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Immutable periodic S×S process grid with row-major rank numbering.
///
/// # Invariants
/// - `side >= 1`.
/// - Rank `r` lives at `(r / side, r % side)`; the mapping is bijective over
///   `0..side²`.
///
/// # Determinism
/// All lookups are pure; the grid never changes after construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProcessGrid {
    side: usize,
}

impl ProcessGrid {
    /// Build a grid with the given side length.
    ///
    /// # Errors
    /// Returns `Err(NotPerfectSquare(0))` for a zero side (an empty grid has
    /// no valid arrangement).
    pub fn new(side: usize) -> Result<Self, StencilError> {
        if side == 0 {
            return Err(StencilError::NotPerfectSquare(0));
        }
        Ok(Self { side })
    }

    /// Derive the grid from a communicator world size.
    ///
    /// # Errors
    /// Returns `Err(NotPerfectSquare(p))` unless `p = S²` for some `S >= 1`.
    /// The driver is expected to surface this as a fatal startup error before
    /// any tile is distributed.
    pub fn from_world_size(p: usize) -> Result<Self, StencilError> {
        let side = (p as f64).sqrt() as usize;
        // float sqrt can land one off near perfect squares; probe both sides
        for s in [side, side + 1] {
            if s * s == p && s > 0 {
                return Ok(Self { side: s });
            }
        }
        Err(StencilError::NotPerfectSquare(p))
    }

    /// Side length S of the grid.
    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Total number of ranks, `S²`.
    #[inline]
    pub fn len(&self) -> usize {
        self.side * self.side
    }

    /// Never true for a constructed grid, since `side >= 1`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rank living at `coords`.
    ///
    /// # Errors
    /// Returns `Err(CoordsOutOfRange)` if either coordinate is `>= S`; callers
    /// that need wraparound should go through [`wrap`](Self::wrap) first.
    pub fn rank_of(&self, coords: GridCoords) -> Result<usize, StencilError> {
        if coords.row >= self.side || coords.col >= self.side {
            return Err(StencilError::CoordsOutOfRange(coords, self.side));
        }
        Ok(coords.row * self.side + coords.col)
    }

    /// Coordinates of `rank`.
    ///
    /// # Errors
    /// Returns `Err(RankOutOfRange)` if `rank >= S²`.
    pub fn coords_of(&self, rank: usize) -> Result<GridCoords, StencilError> {
        if rank >= self.len() {
            return Err(StencilError::RankOutOfRange {
                rank,
                size: self.len(),
            });
        }
        Ok(GridCoords::new(rank / self.side, rank % self.side))
    }

    /// Wrap possibly-negative or overflowing coordinates back into the grid.
    ///
    /// Uses Euclidean remainders, so `(-1, S)` maps to `(S-1, 0)` for any S.
    #[inline]
    pub fn wrap(&self, row: isize, col: isize) -> GridCoords {
        let s = self.side as isize;
        GridCoords::new(row.rem_euclid(s) as usize, col.rem_euclid(s) as usize)
    }
}
