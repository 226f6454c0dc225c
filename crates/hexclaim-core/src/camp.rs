//! Camps and their territory counters.
//!
//! This module contains:
//! - `Camp`, a faction with a base tile and running tallies of what it holds
//! - Base selection: the Earth tiles a camp may start from

use crate::hex::HexCoord;
use crate::terrain::{Element, Terrain};
use serde::{Deserialize, Serialize};

/// Camp identifier (0..N-1, also the turn order)
pub type CampId = u8;

/// A faction expanding from its base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camp {
    /// Position in turn order
    pub id: CampId,
    /// Display name
    pub name: String,
    /// Root of the camp's territory graph
    pub base: HexCoord,
    /// Number of tiles the camp holds
    pub tiles: u32,
    /// Number of resource tiles the camp holds
    pub resources: u32,
}

impl Camp {
    /// Create a camp rooted at `base`, holding nothing yet
    pub fn new(id: CampId, name: String, base: HexCoord) -> Self {
        Self {
            id,
            name,
            base,
            tiles: 0,
            resources: 0,
        }
    }

    /// Default name for a camp index
    pub fn default_name(id: CampId) -> String {
        format!("Camp {}", id + 1)
    }

    /// Count a tile coming under this camp's control
    pub(crate) fn gain(&mut self, has_resource: bool) {
        self.tiles += 1;
        if has_resource {
            self.resources += 1;
        }
    }

    /// Count a tile leaving this camp's control
    pub(crate) fn lose(&mut self, has_resource: bool) {
        self.tiles = self.tiles.saturating_sub(1);
        if has_resource {
            self.resources = self.resources.saturating_sub(1);
        }
    }

    /// Whether the camp holds no tile at all
    pub fn is_wiped_out(&self) -> bool {
        self.tiles == 0
    }
}

/// Whether a camp may start on `coord`: an Earth tile next to a resource
pub fn is_eligible_base(terrain: &Terrain, coord: HexCoord) -> bool {
    let tile = terrain.peek(coord);
    tile.element == Element::Earth
        && !tile.is_owned()
        && coord
            .neighbors()
            .iter()
            .any(|&n| terrain.peek(n).has_resource)
}

/// Every eligible base among `candidates`, in coordinate order
pub fn eligible_bases<'a, I>(terrain: &Terrain, candidates: I) -> Vec<HexCoord>
where
    I: IntoIterator<Item = &'a HexCoord>,
{
    let mut bases: Vec<HexCoord> = candidates
        .into_iter()
        .copied()
        .filter(|&c| is_eligible_base(terrain, c))
        .collect();
    bases.sort();
    bases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut camp = Camp::new(0, Camp::default_name(0), HexCoord::new(0, 0));
        assert_eq!(camp.name, "Camp 1");
        assert!(camp.is_wiped_out());

        camp.gain(false);
        camp.gain(true);
        assert_eq!((camp.tiles, camp.resources), (2, 1));

        camp.lose(true);
        assert_eq!((camp.tiles, camp.resources), (1, 0));
        camp.lose(false);
        camp.lose(false);
        assert_eq!((camp.tiles, camp.resources), (0, 0));
    }

    #[test]
    fn test_base_eligibility() {
        // (0, 2) is a resource tile, so its neighbors qualify when made of Earth.
        let next_to_resource = HexCoord::new(0, 1);
        let far_from_resource = HexCoord::new(1, 0);
        assert!(HexCoord::new(0, 2).is_neighbor_of(&next_to_resource));

        let terrain = Terrain::with_layout(
            11,
            [
                (next_to_resource, Element::Earth),
                (far_from_resource, Element::Earth),
                (HexCoord::new(-1, 1), Element::Fire),
            ],
        );
        assert!(is_eligible_base(&terrain, next_to_resource));
        assert!(!is_eligible_base(&terrain, far_from_resource));
        assert!(!is_eligible_base(&terrain, HexCoord::new(-1, 1)));

        let candidates = [far_from_resource, next_to_resource];
        assert_eq!(eligible_bases(&terrain, &candidates), vec![next_to_resource]);
    }
}
