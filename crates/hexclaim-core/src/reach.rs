//! Movement patterns of each element.
//!
//! A move from a tile reaches a fixed shape of destinations decided only by the
//! tile's element. Some destinations sit behind waypoints: tiles the move has to
//! pass through, which are claimed along with the destination.

use crate::hex::{Direction, HexCoord};
use crate::terrain::Element;
use serde::{Deserialize, Serialize};

use crate::hex::Direction::{East, NorthEast, NorthWest, SouthEast, SouthWest, West};

/// One reachable destination and the tiles crossed to get there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reach {
    /// Where the move lands
    pub destination: HexCoord,
    /// Tiles traversed in order; the last one is the destination
    pub path: Vec<HexCoord>,
}

impl Reach {
    fn direct(destination: HexCoord) -> Self {
        Self {
            destination,
            path: vec![destination],
        }
    }

    fn through(waypoint: HexCoord, destination: HexCoord) -> Self {
        Self {
            destination,
            path: vec![waypoint, destination],
        }
    }

    /// Tiles crossed before the destination
    pub fn waypoints(&self) -> &[HexCoord] {
        &self.path[..self.path.len().saturating_sub(1)]
    }
}

/// All destinations a move from `origin` can reach, in pattern order
pub fn reachable(origin: HexCoord, element: Element) -> Vec<Reach> {
    match element {
        Element::Earth => earth(origin),
        Element::Fire => fire(origin),
        Element::Air => air(origin),
        Element::Water => water(origin),
    }
}

/// A two-tile chain: both the near and the far tile are destinations
fn chain(origin: HexCoord, first: Direction, second: Direction, out: &mut Vec<Reach>) {
    let near = origin.neighbor(first);
    let far = near.neighbor(second);
    out.push(Reach::direct(near));
    out.push(Reach::through(near, far));
}

/// A two-tile stride: only the far tile is a destination, the near one is crossed
fn stride(origin: HexCoord, first: Direction, second: Direction, out: &mut Vec<Reach>) {
    let near = origin.neighbor(first);
    out.push(Reach::through(near, near.neighbor(second)));
}

/// A jump: the tile two steps away is reached without crossing anything
fn leap(origin: HexCoord, first: Direction, second: Direction, out: &mut Vec<Reach>) {
    out.push(Reach::direct(origin.walk(&[first, second])));
}

fn earth(origin: HexCoord) -> Vec<Reach> {
    origin.neighbors().into_iter().map(Reach::direct).collect()
}

//  V
// . .
fn fire(origin: HexCoord) -> Vec<Reach> {
    let mut out = Vec::with_capacity(6);
    chain(origin, NorthEast, NorthEast, &mut out);
    chain(origin, NorthWest, NorthWest, &mut out);
    stride(origin, SouthEast, SouthEast, &mut out);
    stride(origin, SouthWest, SouthWest, &mut out);
    out
}

fn air(origin: HexCoord) -> Vec<Reach> {
    let mut out = Vec::with_capacity(6);
    chain(origin, NorthEast, East, &mut out);
    chain(origin, SouthEast, SouthWest, &mut out);
    chain(origin, West, NorthWest, &mut out);
    out
}

//  .
// ---
//  .
fn water(origin: HexCoord) -> Vec<Reach> {
    let mut out = Vec::with_capacity(6);
    chain(origin, East, East, &mut out);
    chain(origin, West, West, &mut out);
    leap(origin, NorthEast, NorthWest, &mut out);
    leap(origin, SouthEast, SouthWest, &mut out);
    out
}
