//! Toroidal tile lattice: every row and column wraps around, so no edge is special.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Row/column position of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub row: usize,
    pub col: usize,
}

impl TilePos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Offsets of the 8 surrounding tiles as (row delta, col delta, compass bearing).
/// Bearing 0 points toward row - 1 ("up"), 90 toward col + 1.
pub const NEIGHBOR_OFFSETS: [(isize, isize, f64); 8] = [
    (-1, 0, 0.0),
    (-1, 1, 45.0),
    (0, 1, 90.0),
    (1, 1, 135.0),
    (1, 0, 180.0),
    (1, -1, 225.0),
    (0, -1, 270.0),
    (-1, -1, 315.0),
];

/// A neighbor link: target tile index and the bearing from the source tile to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub bearing_deg: f64,
}

/// Immutable adjacency of an N x N toroidal grid, built once.
#[derive(Debug, Clone)]
pub struct Topology {
    size: usize,
    neighbors: Vec<[Neighbor; 8]>,
}

impl Topology {
    pub fn new(size: usize) -> Result<Self, SimError> {
        if size < 3 {
            return Err(SimError::InvalidGridSize(size));
        }
        let mut neighbors = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                let links = NEIGHBOR_OFFSETS.map(|(dr, dc, bearing_deg)| Neighbor {
                    index: wrap(row, dr, size) * size + wrap(col, dc, size),
                    bearing_deg,
                });
                neighbors.push(links);
            }
        }
        Ok(Self { size, neighbors })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tile_count(&self) -> usize {
        self.size * self.size
    }

    pub fn index_of(&self, pos: TilePos) -> Option<usize> {
        if pos.row < self.size && pos.col < self.size {
            Some(pos.row * self.size + pos.col)
        } else {
            None
        }
    }

    pub fn pos_of(&self, index: usize) -> Option<TilePos> {
        if index < self.tile_count() {
            Some(TilePos::new(index / self.size, index % self.size))
        } else {
            None
        }
    }

    pub fn neighbors(&self, index: usize) -> &[Neighbor; 8] {
        &self.neighbors[index]
    }

    pub fn neighbor_indices(&self, index: usize) -> [usize; 8] {
        self.neighbors[index].map(|n| n.index)
    }

    /// Indices of the tile itself plus its 8 neighbors (the 3x3 box).
    pub fn box_indices(&self, index: usize) -> [usize; 9] {
        let ring = self.neighbor_indices(index);
        [
            index, ring[0], ring[1], ring[2], ring[3], ring[4], ring[5], ring[6], ring[7],
        ]
    }
}

fn wrap(value: usize, delta: isize, size: usize) -> usize {
    (value as isize + delta).rem_euclid(size as isize) as usize
}
