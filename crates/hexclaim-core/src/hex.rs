//! Hex coordinate system using axial coordinates (q, r).
//!
//! This module provides the coordinate primitives the rest of the engine keys on:
//! - `HexCoord`: identifies a single tile on the infinite grid
//! - `Direction`: the six neighbor directions, numbered 0..5 counter-clockwise from East
//! - Canonical `"q:r"` keys for exchanging coordinates with renderers and clients
//!
//! Everything here is pure and total over the `i32` domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the six neighbor directions of a hex.
///
/// The discriminant is the direction number used by the movement patterns:
/// 0 is East and numbers increase counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Right
    East = 0,
    /// Top right
    NorthEast = 1,
    /// Top left
    NorthWest = 2,
    /// Left
    West = 3,
    /// Bottom left
    SouthWest = 4,
    /// Bottom right
    SouthEast = 5,
}

impl Direction {
    /// All directions in numbering order
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    /// Direction for a number, wrapping modulo 6
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index % 6) as usize]
    }

    /// The axial offset (dq, dr) of one step in this direction
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (0, -1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (-1, 1),
            Direction::SouthEast => (0, 1),
        }
    }
}

/// Axial coordinate for hex grid.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going south-east
/// - The third coordinate `s` (not stored) satisfies: q + r + s = 0
///
/// The derived ordering (by `q`, then `r`) is what the engine uses whenever it
/// needs a deterministic enumeration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    /// Column (increases going east)
    pub q: i32,
    /// Row (increases going south-east)
    pub r: i32,
}

impl HexCoord {
    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        self.q.wrapping_neg().wrapping_sub(self.r)
    }

    /// Get the neighbor in a specific direction
    pub fn neighbor(&self, direction: Direction) -> HexCoord {
        let (dq, dr) = direction.offset();
        HexCoord::new(self.q.wrapping_add(dq), self.r.wrapping_add(dr))
    }

    /// Follow a sequence of directions, one step each
    pub fn walk(&self, steps: &[Direction]) -> HexCoord {
        steps.iter().fold(*self, |at, &dir| at.neighbor(dir))
    }

    /// The six neighboring hexes in direction order starting from East
    pub fn neighbors(&self) -> [HexCoord; 6] {
        Direction::ALL.map(|dir| self.neighbor(dir))
    }

    /// Whether `other` is one step away from `self`
    pub fn is_neighbor_of(&self, other: &HexCoord) -> bool {
        Direction::ALL.iter().any(|&dir| self.neighbor(dir) == *other)
    }

    /// Distance to another hex (in hex steps).
    ///
    /// Coordinates wrap at the `i32` edges, so `i32::MAX` and `i32::MIN` are one
    /// step apart along the q axis.
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = self.q.wrapping_sub(other.q).unsigned_abs() as u64;
        let dr = self.r.wrapping_sub(other.r).unsigned_abs() as u64;
        let ds = self.s().wrapping_sub(other.s()).unsigned_abs() as u64;
        ((dq + dr + ds) / 2) as u32
    }

    /// All hexes within `radius` steps of `self`, ordered by `q` then `r`
    pub fn within(&self, radius: u32) -> Vec<HexCoord> {
        let radius = radius as i32;
        let mut hexes = Vec::new();
        for dq in -radius..=radius {
            let low = (-radius).max(-dq - radius);
            let high = radius.min(-dq + radius);
            for dr in low..=high {
                hexes.push(HexCoord::new(self.q.wrapping_add(dq), self.r.wrapping_add(dr)));
            }
        }
        hexes
    }

    /// Canonical string key, `"q:r"`
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Parse a canonical key produced by [`HexCoord::key`]
    pub fn from_key(key: &str) -> Result<Self, KeyError> {
        key.parse()
    }
}

/// True iff `b` is `a.neighbor(d)` for some direction `d`
pub fn are_neighbors(a: &HexCoord, b: &HexCoord) -> bool {
    a.is_neighbor_of(b)
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.q, self.r)
    }
}

/// A string that is not a `"q:r"` key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tile key {0:?}, expected \"q:r\"")]
pub struct KeyError(pub String);

impl FromStr for HexCoord {
    type Err = KeyError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let (q, r) = key.split_once(':').ok_or_else(|| KeyError(key.to_string()))?;
        let q = q.parse().map_err(|_| KeyError(key.to_string()))?;
        let r = r.parse().map_err(|_| KeyError(key.to_string()))?;
        Ok(HexCoord::new(q, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_direction_numbering() {
        let origin = HexCoord::new(0, 0);
        assert_eq!(origin.neighbor(Direction::from_index(0)), HexCoord::new(1, 0));
        assert_eq!(origin.neighbor(Direction::from_index(1)), HexCoord::new(1, -1));
        assert_eq!(origin.neighbor(Direction::from_index(2)), HexCoord::new(0, -1));
        assert_eq!(origin.neighbor(Direction::from_index(3)), HexCoord::new(-1, 0));
        assert_eq!(origin.neighbor(Direction::from_index(4)), HexCoord::new(-1, 1));
        assert_eq!(origin.neighbor(Direction::from_index(5)), HexCoord::new(0, 1));
        assert_eq!(Direction::from_index(7), Direction::NorthEast);
    }

    #[test]
    fn test_hex_neighbors() {
        let center = HexCoord::new(3, -7);
        let neighbors = center.neighbors();

        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);

        for neighbor in &neighbors {
            assert_eq!(center.distance_to(neighbor), 1);
            assert!(are_neighbors(&center, neighbor));
            assert!(are_neighbors(neighbor, &center));
        }
        assert!(!are_neighbors(&center, &center));
        assert!(!are_neighbors(&center, &HexCoord::new(5, -7)));
    }

    #[test]
    fn test_hex_distance() {
        let a = HexCoord::new(0, 0);
        assert_eq!(a.distance_to(&HexCoord::new(2, -1)), 2);
        assert_eq!(a.distance_to(&HexCoord::new(-3, 3)), 3);
        assert_eq!(a.distance_to(&HexCoord::new(1, -2)), 2);
    }

    #[test]
    fn test_arithmetic_wraps_at_the_edges() {
        let east_edge = HexCoord::new(i32::MAX, 0);
        assert_eq!(east_edge.neighbor(Direction::East), HexCoord::new(i32::MIN, 0));
        assert_eq!(HexCoord::new(i32::MIN, 0).neighbor(Direction::West), east_edge);
        assert_eq!(
            HexCoord::new(0, i32::MIN).neighbor(Direction::NorthWest),
            HexCoord::new(0, i32::MAX)
        );

        assert_eq!(east_edge.distance_to(&HexCoord::new(i32::MIN, 0)), 1);
        let corner = HexCoord::new(i32::MIN, i32::MIN);
        assert_eq!(corner.distance_to(&corner), 0);
        assert_eq!(corner.s(), 0);
        assert!(corner.distance_to(&HexCoord::new(0, 0)) > 0);
        assert!(corner.neighbors().iter().all(|n| corner.distance_to(n) == 1));
        assert_eq!(HexCoord::new(i32::MAX, i32::MIN).within(1).len(), 7);
    }

    #[test]
    fn test_walk() {
        let origin = HexCoord::new(0, 0);
        let far = origin.walk(&[Direction::East, Direction::East, Direction::NorthWest]);
        assert_eq!(far, HexCoord::new(2, -1));
        assert_eq!(origin.walk(&[]), origin);
    }

    #[test]
    fn test_within_counts() {
        let center = HexCoord::new(4, 4);
        assert_eq!(center.within(0), vec![center]);
        assert_eq!(center.within(1).len(), 7);
        assert_eq!(center.within(3).len(), 37);
        assert!(center.within(3).iter().all(|h| center.distance_to(h) <= 3));
    }

    #[test]
    fn test_key_round_trip() {
        let samples = [
            (0, 0),
            (1, 0),
            (-1, 2),
            (17, -42),
            (i32::MAX, i32::MIN),
            (i32::MIN, i32::MAX),
        ];
        for (q, r) in samples {
            let coord = HexCoord::new(q, r);
            assert_eq!(HexCoord::from_key(&coord.key()), Ok(coord));
        }
        assert_eq!(HexCoord::new(1, 0).key(), "1:0");
        assert_eq!(HexCoord::new(-3, 12).key(), "-3:12");
    }

    #[test]
    fn test_key_rejects_garbage() {
        assert!(HexCoord::from_key("").is_err());
        assert!(HexCoord::from_key("1").is_err());
        assert!(HexCoord::from_key("a:b").is_err());
        assert!(HexCoord::from_key("1:2:3").is_err());
    }

    #[test]
    fn test_keys_are_distinct() {
        let keys: HashSet<String> = HexCoord::new(0, 0).within(4).iter().map(|h| h.key()).collect();
        assert_eq!(keys.len(), 61);
    }
}
