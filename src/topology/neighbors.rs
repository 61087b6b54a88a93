//! Compass directions and the fixed 9-entry neighbor table.
//!
//! Every rank resolves its 8 surrounding ranks (plus itself in the center
//! slot) exactly once at startup. On a periodic grid the table is total: in
//! small grids several slots alias the same peer (S=2 pairs opposite edges,
//! S=1 loops every direction back to self), which is why halo traffic must be
//! disambiguated by direction tags rather than by peer rank alone.

use crate::stencil_error::StencilError;
use crate::topology::grid::{GridCoords, ProcessGrid};

/// The nine compass slots, in row-major order with up-left first.
///
/// The discriminant doubles as the slot index in [`NeighborTable`] and as the
/// per-direction tag offset on the wire, so the order is part of the
/// exchange protocol and must not be rearranged.
#[repr(usize)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    UpLeft = 0,
    Up = 1,
    UpRight = 2,
    Left = 3,
    Center = 4,
    Right = 5,
    DownLeft = 6,
    Down = 7,
    DownRight = 8,
}

impl Direction {
    /// All nine slots in table order.
    pub const ALL: [Direction; 9] = [
        Direction::UpLeft,
        Direction::Up,
        Direction::UpRight,
        Direction::Left,
        Direction::Center,
        Direction::Right,
        Direction::DownLeft,
        Direction::Down,
        Direction::DownRight,
    ];

    /// The eight true neighbors (center excluded), in table order.
    pub const NEIGHBORS: [Direction; 8] = [
        Direction::UpLeft,
        Direction::Up,
        Direction::UpRight,
        Direction::Left,
        Direction::Right,
        Direction::DownLeft,
        Direction::Down,
        Direction::DownRight,
    ];

    /// Slot index, `0..9`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// (Δrow, Δcol) of this direction on the grid.
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::UpLeft => (-1, -1),
            Direction::Up => (-1, 0),
            Direction::UpRight => (-1, 1),
            Direction::Left => (0, -1),
            Direction::Center => (0, 0),
            Direction::Right => (0, 1),
            Direction::DownLeft => (1, -1),
            Direction::Down => (1, 0),
            Direction::DownRight => (1, 1),
        }
    }

    /// The direction a message sent this way arrives from at the peer.
    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::UpLeft => Direction::DownRight,
            Direction::Up => Direction::Down,
            Direction::UpRight => Direction::DownLeft,
            Direction::Left => Direction::Right,
            Direction::Center => Direction::Center,
            Direction::Right => Direction::Left,
            Direction::DownLeft => Direction::UpRight,
            Direction::Down => Direction::Up,
            Direction::DownRight => Direction::UpLeft,
        }
    }

    /// True for the four diagonal slots.
    #[inline]
    pub fn is_corner(self) -> bool {
        matches!(
            self,
            Direction::UpLeft | Direction::UpRight | Direction::DownLeft | Direction::DownRight
        )
    }
}

/// Fixed direction→rank mapping for one process, computed once from its grid
/// coordinates and never mutated afterward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NeighborTable {
    ranks: [usize; 9],
}

impl NeighborTable {
    /// Resolve the table for the process at `coords`.
    ///
    /// Pure function of the grid and the coordinates: each of the eight
    /// compass offsets is wrapped back into the grid and mapped to its rank;
    /// the center slot holds the process's own rank.
    ///
    /// # Errors
    /// Only a malformed `coords` (outside the grid) can fail; wrapped
    /// neighbor coordinates are always in range by construction.
    pub fn resolve(grid: &ProcessGrid, coords: GridCoords) -> Result<Self, StencilError> {
        // validate the center up front so wrap() can't paper over bad input
        let center = grid.rank_of(coords)?;
        let mut ranks = [center; 9];
        for dir in Direction::NEIGHBORS {
            let (dr, dc) = dir.offset();
            let wrapped = grid.wrap(coords.row as isize + dr, coords.col as isize + dc);
            ranks[dir.index()] = grid.rank_of(wrapped)?;
        }
        Ok(Self { ranks })
    }

    /// Resolve the table for a rank rather than explicit coordinates.
    pub fn resolve_for_rank(grid: &ProcessGrid, rank: usize) -> Result<Self, StencilError> {
        Self::resolve(grid, grid.coords_of(rank)?)
    }

    /// Rank in the given slot.
    #[inline]
    pub fn rank(&self, dir: Direction) -> usize {
        self.ranks[dir.index()]
    }

    /// This process's own rank (the center slot).
    #[inline]
    pub fn center(&self) -> usize {
        self.ranks[Direction::Center.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Reference computation straight from the modular arithmetic.
    fn reference_neighbor(side: usize, row: usize, col: usize, dir: Direction) -> usize {
        let s = side as isize;
        let (dr, dc) = dir.offset();
        let r = (row as isize + dr).rem_euclid(s) as usize;
        let c = (col as isize + dc).rem_euclid(s) as usize;
        r * side + c
    }

    #[test]
    fn opposite_is_involution() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            let (dr, dc) = dir.offset();
            let (or, oc) = dir.opposite().offset();
            assert_eq!((dr + or, dc + oc), (0, 0));
        }
    }

    #[test]
    fn wraps_match_reference_for_small_grids() {
        for side in 1..=4usize {
            let grid = ProcessGrid::new(side).unwrap();
            for row in 0..side {
                for col in 0..side {
                    let table =
                        NeighborTable::resolve(&grid, GridCoords::new(row, col)).unwrap();
                    assert_eq!(table.center(), row * side + col);
                    for dir in Direction::NEIGHBORS {
                        assert_eq!(
                            table.rank(dir),
                            reference_neighbor(side, row, col, dir),
                            "side={side} ({row},{col}) {dir:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn single_rank_grid_is_all_self() {
        let grid = ProcessGrid::new(1).unwrap();
        let table = NeighborTable::resolve(&grid, GridCoords::new(0, 0)).unwrap();
        for dir in Direction::ALL {
            assert_eq!(table.rank(dir), 0);
        }
    }

    #[test]
    fn two_by_two_pairs_opposite_edges() {
        let grid = ProcessGrid::new(2).unwrap();
        let table = NeighborTable::resolve(&grid, GridCoords::new(0, 0)).unwrap();
        // up and down both wrap to the rank below, left and right to the one beside
        assert_eq!(table.rank(Direction::Up), table.rank(Direction::Down));
        assert_eq!(table.rank(Direction::Left), table.rank(Direction::Right));
        // all four corners alias the diagonal rank
        assert_eq!(table.rank(Direction::UpLeft), 3);
        assert_eq!(table.rank(Direction::DownRight), 3);
    }

    #[test]
    fn out_of_range_coords_rejected() {
        let grid = ProcessGrid::new(2).unwrap();
        assert!(NeighborTable::resolve(&grid, GridCoords::new(2, 0)).is_err());
    }

    proptest! {
        #[test]
        fn table_matches_reference(side in 1usize..8, rank_seed in 0usize..64) {
            let grid = ProcessGrid::new(side).unwrap();
            let rank = rank_seed % grid.len();
            let coords = grid.coords_of(rank).unwrap();
            let table = NeighborTable::resolve_for_rank(&grid, rank).unwrap();
            for dir in Direction::NEIGHBORS {
                prop_assert_eq!(
                    table.rank(dir),
                    reference_neighbor(side, coords.row, coords.col, dir)
                );
            }
        }
    }
}
