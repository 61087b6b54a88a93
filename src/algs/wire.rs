//! Fixed, little-endian wire types and the tag namespace for halo traffic.
//!
//! All multi-byte integers are **little-endian** on the wire: stored pre-LE
//! with `.to_le()` and decoded with `.from_le()`, so heterogeneous-endian
//! runs fail loudly in the geometry handshake instead of silently filtering
//! garbage.

use crate::data::tile::TileDims;
use crate::stencil_error::StencilError;
use crate::topology::neighbors::Direction;
use bytemuck::{Pod, Zeroable};

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// Typed tag namespace. A `CommTag` is a base value; per-direction traffic
/// offsets it by the direction's slot index, so the full exchange uses a
/// contiguous block of 9 tags per base.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommTag(u16);

impl CommTag {
    pub const fn new(base: u16) -> Self {
        Self(base)
    }

    #[inline]
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Tag for traffic travelling in `dir`.
    ///
    /// Tagging by direction of travel (not by peer) is what keeps opposite
    /// edges apart when wraparound aliases peers: on a 2-wide grid the up and
    /// down neighbor are the same rank, and on a 1-wide grid all eight are
    /// self.
    #[inline]
    pub fn for_direction(self, dir: Direction) -> u16 {
        self.0 + dir.index() as u16
    }
}

/// Base tag of the one-time geometry handshake.
pub const GEOMETRY_TAG: CommTag = CommTag::new(0x4800);
/// Base tag of per-iteration halo traffic.
pub const HALO_TAG: CommTag = CommTag::new(0x4810);

/// Tile geometry as exchanged during the startup handshake.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireDims {
    width_le: u32,
    height_le: u32,
    channels_le: u32,
}

impl WireDims {
    pub fn of(dims: TileDims) -> Self {
        Self {
            width_le: (dims.width as u32).to_le(),
            height_le: (dims.height as u32).to_le(),
            channels_le: (dims.channels as u32).to_le(),
        }
    }

    /// Decode back into validated dims.
    ///
    /// # Errors
    /// `ZeroTileDim` if the peer sent a degenerate geometry.
    pub fn decode(&self) -> Result<TileDims, StencilError> {
        TileDims::new(
            u32::from_le(self.width_le) as usize,
            u32::from_le(self.height_le) as usize,
            u32::from_le(self.channels_le) as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_tags_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for dir in Direction::NEIGHBORS {
            assert!(seen.insert(HALO_TAG.for_direction(dir)));
        }
        // the handshake block must not overlap the halo block
        for dir in Direction::NEIGHBORS {
            assert!(!seen.contains(&GEOMETRY_TAG.for_direction(dir)));
        }
    }

    #[test]
    fn wire_dims_roundtrip() {
        let dims = TileDims::new(640, 480, 3).unwrap();
        let wire = WireDims::of(dims);
        assert_eq!(wire.decode().unwrap(), dims);
        let bytes = cast_slice(std::slice::from_ref(&wire));
        assert_eq!(bytes.len(), 12);
        let mut copy = WireDims::zeroed();
        cast_slice_mut(std::slice::from_mut(&mut copy)).copy_from_slice(bytes);
        assert_eq!(copy.decode().unwrap(), dims);
    }

    #[test]
    fn degenerate_wire_dims_rejected() {
        let wire = WireDims::zeroed();
        assert!(matches!(wire.decode(), Err(StencilError::ZeroTileDim)));
    }
}
