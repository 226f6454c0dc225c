//! Procedural terrain store.
//!
//! This module contains:
//! - The four elements a tile can be made of, and their transition cycle
//! - `Tile`, the per-hex record holding immutable terrain and mutable ownership
//! - `Terrain`, the sparse store that generates tiles on first access
//!
//! Tile attributes are a pure function of the world seed and the coordinate, so
//! the terrain is the same whatever order the map gets explored in.

use crate::camp::CampId;
use crate::hex::HexCoord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Element a tile is made of. Decides how moves from the tile can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    /// Reaches all six neighbors
    Earth,
    /// Reaches forward in two prongs
    Fire,
    /// Reaches along three bent chains
    Air,
    /// Reaches along an axis and two diagonals
    Water,
}

impl Element {
    /// All elements
    pub const ALL: [Element; 4] = [Element::Earth, Element::Fire, Element::Air, Element::Water];

    /// The element this one flows into: Fire → Air → Water → Fire.
    ///
    /// Earth takes no part in the cycle.
    pub fn transition(&self) -> Option<Element> {
        match self {
            Element::Fire => Some(Element::Air),
            Element::Air => Some(Element::Water),
            Element::Water => Some(Element::Fire),
            Element::Earth => None,
        }
    }

    /// The element that flows into this one
    pub fn anti_transition(&self) -> Option<Element> {
        match self {
            Element::Fire => Some(Element::Water),
            Element::Air => Some(Element::Fire),
            Element::Water => Some(Element::Air),
            Element::Earth => None,
        }
    }

    /// Whether `other` is the transition element of `self`
    pub fn flows_into(&self, other: Element) -> bool {
        self.transition() == Some(other)
    }
}

/// Whether a coordinate carries a resource.
///
/// Resources sit on a fixed lattice so every camp finds them in the same places.
pub fn has_resource_at(coord: HexCoord) -> bool {
    coord.q.rem_euclid(3) == 0 && coord.r.rem_euclid(3) == 2
}

/// A single hex tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Position on the hex grid
    pub coord: HexCoord,
    /// What the tile is made of (never changes)
    pub element: Element,
    /// Whether the tile is a resource (never changes)
    pub has_resource: bool,
    /// Stable sample in `[0, 1)` for cosmetic jitter; the rules never read it
    pub seed: f64,
    /// Camp holding the tile, if any
    pub owner: Option<CampId>,
    /// Combat strength; zero whenever the tile is unowned
    pub power: u32,
    /// Improvement built on the tile
    pub fortification: Option<Element>,
    /// Outgoing edges of the territory graph, in the order they were made
    pub links: Vec<HexCoord>,
}

impl Tile {
    fn generate(world_seed: u64, coord: HexCoord) -> Self {
        let mut rng = StdRng::seed_from_u64(tile_seed(world_seed, coord));
        let element = Element::ALL[rng.gen_range(0..Element::ALL.len())];
        Self::with_element(rng.gen(), coord, element)
    }

    fn with_element(seed: f64, coord: HexCoord, element: Element) -> Self {
        Self {
            coord,
            element,
            has_resource: has_resource_at(coord),
            seed,
            owner: None,
            power: 0,
            fortification: None,
            links: Vec::new(),
        }
    }

    /// Whether the tile belongs to some camp
    pub fn is_owned(&self) -> bool {
        self.owner.is_some()
    }

    /// Whether the tile has an edge towards `coord`
    pub fn links_to(&self, coord: &HexCoord) -> bool {
        self.links.contains(coord)
    }

    /// Add an outgoing edge unless it already exists
    pub(crate) fn link(&mut self, coord: HexCoord) {
        if !self.links_to(&coord) {
            self.links.push(coord);
        }
    }

    /// Hand the tile to `camp`, dropping whatever edges the previous holder made
    pub(crate) fn claim(&mut self, camp: CampId, power: u32) {
        if self.owner != Some(camp) {
            self.links.clear();
        }
        self.owner = Some(camp);
        self.power = power;
    }

    /// Drop the tile out of the territory graph
    pub(crate) fn clear(&mut self) {
        self.owner = None;
        self.power = 0;
        self.fortification = None;
        self.links.clear();
    }
}

/// Mix the world seed and a coordinate into a per-tile seed (splitmix64 finalizer)
fn tile_seed(world_seed: u64, coord: HexCoord) -> u64 {
    let packed = ((coord.q as u32 as u64) << 32) | coord.r as u32 as u64;
    let mut z = world_seed ^ packed.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Sparse store of every tile touched so far
#[derive(Debug, Clone)]
pub struct Terrain {
    /// World seed every tile is derived from
    seed: u64,
    /// Tiles generated so far
    tiles: HashMap<HexCoord, Tile>,
}

impl Terrain {
    /// Create a terrain with a random world seed
    pub fn new() -> Self {
        Self::with_seed(rand::thread_rng().gen())
    }

    /// Create a terrain with a fixed world seed, for reproducible maps
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            tiles: HashMap::new(),
        }
    }

    /// Create a terrain where some tiles are generated up front with a chosen element.
    ///
    /// Listed tiles behave exactly like generated ones afterwards; every other
    /// coordinate is derived from `seed` as usual.
    pub fn with_layout<I>(seed: u64, layout: I) -> Self
    where
        I: IntoIterator<Item = (HexCoord, Element)>,
    {
        let mut terrain = Self::with_seed(seed);
        for (coord, element) in layout {
            let generated = Tile::generate(seed, coord);
            terrain
                .tiles
                .entry(coord)
                .or_insert_with(|| Tile::with_element(generated.seed, coord, element));
        }
        terrain
    }

    /// World seed this terrain is derived from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the tile at `coord`, generating it on first access
    pub fn get(&mut self, coord: HexCoord) -> &Tile {
        self.tile_mut(coord)
    }

    /// Read a tile without caching it.
    ///
    /// Returns the stored tile when it exists, otherwise the tile that `get` would
    /// generate. Works through a shared reference, so renderers can explore
    /// while the engine holds the store.
    pub fn peek(&self, coord: HexCoord) -> Cow<'_, Tile> {
        match self.tiles.get(&coord) {
            Some(tile) => Cow::Borrowed(tile),
            None => Cow::Owned(Tile::generate(self.seed, coord)),
        }
    }

    /// Element at `coord`
    pub fn element(&self, coord: HexCoord) -> Element {
        self.peek(coord).element
    }

    /// The single write access point for tiles
    pub(crate) fn tile_mut(&mut self, coord: HexCoord) -> &mut Tile {
        let seed = self.seed;
        self.tiles
            .entry(coord)
            .or_insert_with(|| Tile::generate(seed, coord))
    }

    /// Number of tiles generated so far
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether no tile has been generated yet
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterate over generated tiles (in no particular order)
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Tiles currently held by any camp
    pub fn owned_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values().filter(|t| t.is_owned())
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_cycle() {
        assert_eq!(Element::Fire.transition(), Some(Element::Air));
        assert_eq!(Element::Air.transition(), Some(Element::Water));
        assert_eq!(Element::Water.transition(), Some(Element::Fire));
        assert_eq!(Element::Earth.transition(), None);

        for element in Element::ALL {
            if let Some(next) = element.transition() {
                assert_eq!(next.anti_transition(), Some(element));
            }
        }
        assert!(Element::Water.flows_into(Element::Fire));
        assert!(!Element::Earth.flows_into(Element::Water));
    }

    #[test]
    fn test_resource_lattice() {
        assert!(has_resource_at(HexCoord::new(0, 2)));
        assert!(has_resource_at(HexCoord::new(3, 5)));
        assert!(has_resource_at(HexCoord::new(-3, -1)));
        assert!(!has_resource_at(HexCoord::new(0, 0)));
        assert!(!has_resource_at(HexCoord::new(1, 2)));

        let count = HexCoord::new(0, 0)
            .within(10)
            .into_iter()
            .filter(|&c| has_resource_at(c))
            .count();
        assert!(count > 0);
    }

    #[test]
    fn test_tile_is_stable() {
        let mut terrain = Terrain::with_seed(7);
        let coord = HexCoord::new(2, -5);
        let first = terrain.get(coord).clone();

        for other in HexCoord::new(0, 0).within(5) {
            terrain.get(other);
        }

        let second = terrain.get(coord);
        assert_eq!(first.element, second.element);
        assert_eq!(first.has_resource, second.has_resource);
        assert_eq!(first.seed, second.seed);
    }

    #[test]
    fn test_generation_ignores_access_order() {
        let coords = HexCoord::new(0, 0).within(6);

        let mut forward = Terrain::with_seed(99);
        for &c in &coords {
            forward.get(c);
        }
        let mut backward = Terrain::with_seed(99);
        for &c in coords.iter().rev() {
            backward.get(c);
        }

        for &c in &coords {
            assert_eq!(forward.peek(c).element, backward.peek(c).element);
            assert_eq!(forward.peek(c).seed, backward.peek(c).seed);
        }
    }

    #[test]
    fn test_peek_matches_get() {
        let mut terrain = Terrain::with_seed(3);
        let coord = HexCoord::new(-8, 1);
        let peeked = terrain.peek(coord).into_owned();
        assert!(terrain.is_empty());
        assert_eq!(terrain.get(coord), &peeked);
        assert_eq!(terrain.len(), 1);
    }

    #[test]
    fn test_every_element_appears() {
        let terrain = Terrain::with_seed(1234);
        let elements: Vec<Element> = HexCoord::new(0, 0)
            .within(6)
            .into_iter()
            .map(|c| terrain.element(c))
            .collect();
        for element in Element::ALL {
            assert!(elements.contains(&element), "{:?} never generated", element);
        }
    }

    #[test]
    fn test_layout_overrides_element() {
        let coord = HexCoord::new(0, 0);
        let mut terrain = Terrain::with_layout(5, [(coord, Element::Water)]);
        assert_eq!(terrain.get(coord).element, Element::Water);
        assert_eq!(terrain.get(coord).owner, None);
        assert_eq!(terrain.get(coord).power, 0);
    }

    #[test]
    fn test_claim_drops_previous_links() {
        let mut tile = Tile::with_element(0.5, HexCoord::new(0, 0), Element::Earth);
        tile.claim(0, 2);
        tile.link(HexCoord::new(1, 0));
        tile.link(HexCoord::new(1, 0));
        assert_eq!(tile.links.len(), 1);

        tile.claim(0, 3);
        assert_eq!(tile.links.len(), 1);

        tile.claim(1, 1);
        assert!(tile.links.is_empty());
        assert_eq!(tile.owner, Some(1));

        tile.fortification = Some(Element::Fire);
        tile.clear();
        assert_eq!(tile.owner, None);
        assert_eq!(tile.power, 0);
        assert_eq!(tile.fortification, None);
    }
}
