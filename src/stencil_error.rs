//! StencilError: Unified error type for halo-stencil public APIs
//!
//! This error type is used throughout the halo-stencil library to provide
//! robust, non-panicking error handling for all public APIs. There is no
//! recoverable-error path inside the engine: a failed exchange or a malformed
//! configuration terminates the run, because a partially exchanged halo
//! silently corrupts the convolution rather than crashing it.

use crate::topology::grid::GridCoords;
use thiserror::Error;

/// Unified error type for halo-stencil operations.
#[derive(Debug, Error)]
pub enum StencilError {
    /// World size cannot be arranged into a square periodic grid.
    #[error("process count {0} is not a perfect square")]
    NotPerfectSquare(usize),
    /// A rank was outside the grid it was resolved against.
    #[error("rank {rank} out of range for {size}-process grid")]
    RankOutOfRange { rank: usize, size: usize },
    /// Grid coordinates outside the S×S grid.
    #[error("coordinates {0:?} out of range for side {1}")]
    CoordsOutOfRange(GridCoords, usize),
    /// Tile dimensions must all be non-zero.
    #[error("tile dimension must be non-zero (width, height and channels)")]
    ZeroTileDim,
    /// A caller-supplied buffer does not match the tile geometry.
    #[error("tile buffer length mismatch: expected {expected} bytes, found {found}")]
    TileLengthMismatch { expected: usize, found: usize },
    /// A strided gather/scatter would touch bytes outside the tile buffer.
    #[error("strided region out of bounds: origin {origin}, span {span}, buffer {buf_len}")]
    RegionOutOfBounds {
        origin: usize,
        span: usize,
        buf_len: usize,
    },
    /// A gather/scatter wire buffer has the wrong length for the region.
    #[error("region wire buffer length mismatch: expected {expected} bytes, found {found}")]
    RegionLengthMismatch { expected: usize, found: usize },
    /// Filter weights must not sum to zero (normalization divides by the sum).
    #[error("filter weights must have a non-zero sum")]
    ZeroFilterWeight,
    /// Source and destination tiles of a filter pass differ in geometry.
    #[error("filter source/destination dims differ: {src:?} vs {dst:?}")]
    DimsMismatch {
        src: crate::data::tile::TileDims,
        dst: crate::data::tile::TileDims,
    },
    /// A halo ring built for one geometry was used with another.
    #[error("halo ring dims {halo:?} do not match tile dims {tile:?}")]
    HaloDimsMismatch {
        halo: crate::data::tile::TileDims,
        tile: crate::data::tile::TileDims,
    },
    /// A transfer with a neighbor failed or returned the wrong byte count.
    #[error("communication error with rank {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The startup geometry handshake found a neighbor with a different tile.
    #[error("halo geometry mismatch with rank {neighbor}: local {local:?}, remote {remote:?}")]
    GeometryMismatch {
        neighbor: usize,
        local: crate::data::tile::TileDims,
        remote: crate::data::tile::TileDims,
    },
}
