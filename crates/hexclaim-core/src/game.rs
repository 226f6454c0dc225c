//! Core conquest state machine.
//!
//! This module contains the main `Conquest` struct: turn order, move validation,
//! captures, the disconnection sweep that keeps every territory attached to its
//! base, and the win conditions.

use crate::actions::{GameEvent, Move};
use crate::camp::{eligible_bases, Camp, CampId};
use crate::hex::HexCoord;
use crate::reach::{reachable, Reach};
use crate::terrain::{Terrain, Tile};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

/// Settings for a new game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of camps (at least 2)
    pub camps: u8,
    /// Power of each base tile at the start
    pub base_power: u32,
    /// Seed for terrain and base placement; random when unset
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            camps: 2,
            base_power: 1,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Check the settings can start a game
    pub fn validate(&self) -> Result<(), GameError> {
        if self.camps < 2 {
            return Err(GameError::InvalidConfig(format!(
                "need at least 2 camps, got {}",
                self.camps
            )));
        }
        if self.base_power == 0 {
            return Err(GameError::InvalidConfig("base power must be positive".into()));
        }
        Ok(())
    }
}

/// How the game was won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VictoryType {
    /// A camp was wiped off the map
    Supremacy,
    /// A camp holds half of the visible resources
    Economic,
}

/// Final ranking, recorded once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOver {
    /// Camps from most to least victorious
    pub winners: Vec<CampId>,
    pub victory: VictoryType,
}

/// Errors that can occur when setting up a game or applying moves
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Tile has no power to move")]
    NoPower,

    #[error("Destination is not reachable from this tile")]
    Unreachable,

    #[error("Tile is already fortified")]
    AlreadyFortified,

    #[error("Game is over")]
    GameOver,

    #[error("No eligible base tile for camp {0}")]
    DegenerateSetup(CampId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Outcome of [`Conquest::submit`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Whether the move changed the game
    pub applied: bool,
    /// What happened, empty when rejected
    pub events: Vec<GameEvent>,
    /// Why the move was rejected
    pub error: Option<GameError>,
}

/// The complete game state
#[derive(Debug, Clone)]
pub struct Conquest {
    /// Every tile explored so far
    terrain: Terrain,
    /// All camps, indexed by id
    camps: Vec<Camp>,
    /// Camp to move
    turn: CampId,
    /// Number of turns played
    turn_number: u32,
    /// Tiles the viewport has revealed; never shrinks
    visible: HashSet<HexCoord>,
    /// Set once a win condition fires
    game_over: Option<GameOver>,
}

impl Conquest {
    /// Create a new game on fresh terrain, placing bases at random among `visible`
    pub fn new<I>(config: GameConfig, visible: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = HexCoord>,
    {
        let terrain = match config.seed {
            Some(seed) => Terrain::with_seed(seed),
            None => Terrain::new(),
        };
        Self::with_terrain(config, terrain, visible)
    }

    /// Create a new game on the given terrain, placing bases at random among `visible`.
    ///
    /// Bases go on visible Earth tiles next to a resource, one per camp.
    pub fn with_terrain<I>(config: GameConfig, terrain: Terrain, visible: I) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = HexCoord>,
    {
        config.validate()?;
        let visible: HashSet<HexCoord> = visible.into_iter().collect();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut candidates = eligible_bases(&terrain, &visible);
        let mut bases = Vec::with_capacity(config.camps as usize);
        for id in 0..config.camps {
            if candidates.is_empty() {
                return Err(GameError::DegenerateSetup(id));
            }
            let pick = rng.gen_range(0..candidates.len());
            bases.push(candidates.swap_remove(pick));
        }

        Self::with_bases(config, terrain, visible, bases)
    }

    /// Create a game with bases chosen by the caller.
    ///
    /// Each base must be visible and distinct from the others.
    pub fn with_bases<I>(
        config: GameConfig,
        terrain: Terrain,
        visible: I,
        bases: Vec<HexCoord>,
    ) -> Result<Self, GameError>
    where
        I: IntoIterator<Item = HexCoord>,
    {
        config.validate()?;
        if bases.len() != config.camps as usize {
            return Err(GameError::InvalidConfig(format!(
                "{} bases given for {} camps",
                bases.len(),
                config.camps
            )));
        }

        let mut game = Self {
            terrain,
            camps: Vec::with_capacity(bases.len()),
            turn: 0,
            turn_number: 0,
            visible: visible.into_iter().collect(),
            game_over: None,
        };

        for (id, base) in bases.into_iter().enumerate() {
            let id = id as CampId;
            if !game.visible.contains(&base) || game.terrain.peek(base).is_owned() {
                return Err(GameError::DegenerateSetup(id));
            }
            game.camps.push(Camp::new(id, Camp::default_name(id), base));
            game.transfer(base, id, config.base_power);
        }

        debug!(
            camps = game.camps.len(),
            visible = game.visible.len(),
            "conquest set up"
        );
        Ok(game)
    }

    /// Rename camps, in id order
    pub fn set_camp_names(&mut self, names: Vec<String>) {
        for (camp, name) in self.camps.iter_mut().zip(names) {
            camp.name = name;
        }
    }

    // ==================== Queries ====================

    /// Camp to move
    pub fn turn(&self) -> CampId {
        self.turn
    }

    /// Number of turns played so far
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// Final ranking, once the game is decided
    pub fn game_over(&self) -> Option<&GameOver> {
        self.game_over.as_ref()
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.game_over.is_some()
    }

    /// All camps, indexed by id
    pub fn camps(&self) -> &[Camp] {
        &self.camps
    }

    /// Get a camp by id
    pub fn camp(&self, id: CampId) -> Option<&Camp> {
        self.camps.get(id as usize)
    }

    /// Read-only access to the terrain store
    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Get a tile (without caching it)
    pub fn tile(&self, coord: HexCoord) -> Cow<'_, Tile> {
        self.terrain.peek(coord)
    }

    /// Tiles revealed so far
    pub fn visible(&self) -> &HashSet<HexCoord> {
        &self.visible
    }

    /// Whether a tile has been revealed
    pub fn is_visible(&self, coord: &HexCoord) -> bool {
        self.visible.contains(coord)
    }

    /// Reveal more tiles. Visibility only ever grows.
    pub fn reveal<I>(&mut self, coords: I)
    where
        I: IntoIterator<Item = HexCoord>,
    {
        self.visible.extend(coords);
    }

    /// Number of resource tiles among the visible ones
    pub fn total_resources(&self) -> u32 {
        self.visible
            .iter()
            .filter(|&&c| self.terrain.peek(c).has_resource)
            .count() as u32
    }

    /// Tiles held by `camp`, in coordinate order
    pub fn owned_tiles(&self, camp: CampId) -> Vec<HexCoord> {
        let mut tiles: Vec<HexCoord> = self
            .terrain
            .owned_tiles()
            .filter(|t| t.owner == Some(camp))
            .map(|t| t.coord)
            .collect();
        tiles.sort();
        tiles
    }

    /// Summed power of every edge aimed at `coord` from a tile not owned by its holder
    pub fn power_against(&self, coord: HexCoord) -> u32 {
        let holder = self.terrain.peek(coord).owner;
        self.terrain
            .owned_tiles()
            .filter(|t| t.owner != holder && t.links_to(&coord))
            .map(|t| t.power)
            .sum()
    }

    /// Destinations a move from `origin` may target right now.
    ///
    /// Empty unless the tile is owned and has power. A destination is kept when it
    /// is visible, it is not already held by the same camp, no waypoint is owned
    /// by anyone, and `origin` has no edge to it yet.
    pub fn accessible_moves(&self, origin: HexCoord) -> Vec<Reach> {
        let tile = self.terrain.peek(origin);
        let camp = match tile.owner {
            Some(camp) if tile.power > 0 => camp,
            _ => return Vec::new(),
        };

        reachable(origin, tile.element)
            .into_iter()
            .filter(|reach| {
                self.visible.contains(&reach.destination)
                    && self.terrain.peek(reach.destination).owner != Some(camp)
                    && reach
                        .waypoints()
                        .iter()
                        .all(|&w| !self.terrain.peek(w).is_owned())
                    && !tile.links_to(&reach.destination)
            })
            .collect()
    }

    /// Check whether the camp to move may submit `mv`
    pub fn valid_move(&self, mv: &Move) -> Result<(), GameError> {
        if self.game_over.is_some() {
            return Err(GameError::GameOver);
        }
        match *mv {
            Move::Advance {
                origin,
                destination,
            } => self.check_advance(origin, destination).map(|_| ()),
            Move::Build { origin, .. } => self.check_build(origin),
            Move::Pass => Ok(()),
        }
    }

    /// Whether `mv` would be accepted
    pub fn is_valid_move(&self, mv: &Move) -> bool {
        self.valid_move(mv).is_ok()
    }

    // ==================== Mutation ====================

    /// Submit a move for the camp to move.
    ///
    /// Illegal moves are expected input: they are reported, never raised, and
    /// leave the game untouched.
    pub fn submit(&mut self, mv: Move) -> Submission {
        match self.apply_move(&mv) {
            Ok(events) => Submission {
                applied: true,
                events,
                error: None,
            },
            Err(error) => {
                debug!(camp = self.turn, ?mv, %error, "move rejected");
                Submission {
                    applied: false,
                    events: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    /// Apply a move to the game state
    pub fn apply_move(&mut self, mv: &Move) -> Result<Vec<GameEvent>, GameError> {
        if self.game_over.is_some() {
            return Err(GameError::GameOver);
        }

        let camp = self.turn;
        let mut events = Vec::new();

        match *mv {
            Move::Advance {
                origin,
                destination,
            } => {
                let reach = self.check_advance(origin, destination)?;
                events.extend(self.advance(origin, reach));
                events.extend(self.disconnect_orphans());
                events.extend(self.end_turn());
            }

            Move::Build { origin, element } => {
                self.check_build(origin)?;
                self.terrain.tile_mut(origin).fortification = Some(element);
                events.push(GameEvent::Fortified {
                    camp,
                    location: origin,
                    element,
                });
            }

            Move::Pass => {
                events.push(GameEvent::TurnPassed { camp });
                events.extend(self.end_turn());
            }
        }

        Ok(events)
    }

    // ==================== Helper Methods ====================

    fn check_advance(&self, origin: HexCoord, destination: HexCoord) -> Result<Reach, GameError> {
        let tile = self.terrain.peek(origin);
        if tile.owner != Some(self.turn) {
            return Err(GameError::NotYourTurn);
        }
        if tile.power == 0 {
            return Err(GameError::NoPower);
        }
        self.accessible_moves(origin)
            .into_iter()
            .find(|reach| reach.destination == destination)
            .ok_or(GameError::Unreachable)
    }

    fn check_build(&self, origin: HexCoord) -> Result<(), GameError> {
        let tile = self.terrain.peek(origin);
        if tile.owner != Some(self.turn) {
            return Err(GameError::NotYourTurn);
        }
        if tile.fortification.is_some() {
            return Err(GameError::AlreadyFortified);
        }
        Ok(())
    }

    /// Resolve an attack from `origin` along `reach`
    fn advance(&mut self, origin: HexCoord, reach: Reach) -> Vec<GameEvent> {
        let camp = self.turn;
        let destination = reach.destination;
        let (attack, attack_element) = {
            let tile = self.terrain.peek(origin);
            (tile.power, tile.element)
        };
        let (holder, defense, target_element) = {
            let tile = self.terrain.peek(destination);
            (tile.owner, tile.power, tile.element)
        };

        // Only edges already pressing on the target count; the new one lands after.
        let pressure = self.power_against(destination);

        if holder.is_some() && defense >= pressure {
            self.terrain.tile_mut(origin).link(destination);
            let pressure = pressure + attack;
            debug!(camp, %origin, %destination, pressure, defense, "attack held");
            return vec![GameEvent::LinkProjected {
                camp,
                origin,
                target: destination,
                pressure,
                defense,
            }];
        }

        let mut previous = origin;
        for &waypoint in reach.waypoints() {
            self.transfer(waypoint, camp, 0);
            self.terrain.tile_mut(previous).link(waypoint);
            previous = waypoint;
        }

        let bonus = u32::from(attack_element.flows_into(target_element));
        let power = attack + bonus;
        self.transfer(destination, camp, power);
        self.terrain.tile_mut(previous).link(destination);

        debug!(camp, %origin, %destination, power, from = ?holder, "tile captured");
        vec![GameEvent::TileCaptured {
            camp,
            from: holder,
            location: destination,
            waypoints: reach.waypoints().to_vec(),
            power,
        }]
    }

    /// Give a tile to `camp`, keeping both camps' counters in step
    fn transfer(&mut self, coord: HexCoord, camp: CampId, power: u32) {
        let tile = self.terrain.tile_mut(coord);
        let previous = tile.owner;
        let has_resource = tile.has_resource;
        tile.claim(camp, power);

        if previous != Some(camp) {
            if let Some(loser) = previous {
                self.camps[loser as usize].lose(has_resource);
            }
            self.camps[camp as usize].gain(has_resource);
        }
    }

    /// Tiles of `camp` reachable from its base through its own tiles
    fn anchored(&self, camp: CampId) -> HashSet<HexCoord> {
        let mut anchored = HashSet::new();
        let base = self.camps[camp as usize].base;
        if self.terrain.peek(base).owner != Some(camp) {
            return anchored;
        }

        let mut stack = vec![base];
        while let Some(coord) = stack.pop() {
            if !anchored.insert(coord) {
                continue;
            }
            let tile = self.terrain.peek(coord);
            for next in &tile.links {
                if !anchored.contains(next) && self.terrain.peek(*next).owner == Some(camp) {
                    stack.push(*next);
                }
            }
        }
        anchored
    }

    /// Clear the part of `camp`'s territory hanging off `start`.
    ///
    /// Walks `links` depth first through tiles still owned by `camp`, skipping the
    /// `anchored` ones, and strips every tile it visits. Returns the cleared tiles.
    fn kill_subgraph(
        &mut self,
        start: HexCoord,
        camp: CampId,
        anchored: &HashSet<HexCoord>,
    ) -> Vec<HexCoord> {
        let mut visited = HashSet::new();
        let mut cleared = Vec::new();
        let mut stack = vec![start];

        while let Some(coord) = stack.pop() {
            if anchored.contains(&coord) || !visited.insert(coord) {
                continue;
            }
            let tile = self.terrain.tile_mut(coord);
            if tile.owner != Some(camp) {
                continue;
            }
            let links = std::mem::take(&mut tile.links);
            let has_resource = tile.has_resource;
            tile.clear();

            self.camps[camp as usize].lose(has_resource);
            cleared.push(coord);
            stack.extend(links);
        }

        cleared
    }

    /// Drop an owned tile out of the graph, whatever camp holds it
    fn clear_tile(&mut self, coord: HexCoord) -> Option<CampId> {
        let tile = self.terrain.tile_mut(coord);
        let owner = tile.owner?;
        let has_resource = tile.has_resource;
        tile.clear();
        self.camps[owner as usize].lose(has_resource);
        Some(owner)
    }

    /// Remove every edge that points at an unowned tile. Returns how many went.
    fn prune_dangling_links(&mut self) -> usize {
        let owned: HashSet<HexCoord> = self.terrain.owned_tiles().map(|t| t.coord).collect();
        let mut removed = 0;
        for coord in &owned {
            let tile = self.terrain.tile_mut(*coord);
            let before = tile.links.len();
            tile.links.retain(|next| owned.contains(next));
            removed += before - tile.links.len();
        }
        removed
    }

    /// Clear everything cut off from its base, until nothing else falls.
    ///
    /// Each round clears tiles of every camp that no longer hang off their base,
    /// then powerless dead ends, then edges into cleared tiles.
    fn disconnect_orphans(&mut self) -> Vec<GameEvent> {
        let mut lost: BTreeMap<CampId, Vec<HexCoord>> = BTreeMap::new();

        loop {
            let mut changed = false;

            for camp in 0..self.camps.len() as CampId {
                let anchored = self.anchored(camp);
                for orphan in self.owned_tiles(camp) {
                    if anchored.contains(&orphan) {
                        continue;
                    }
                    let cleared = self.kill_subgraph(orphan, camp, &anchored);
                    changed |= !cleared.is_empty();
                    lost.entry(camp).or_default().extend(cleared);
                }
            }

            let dead_ends: Vec<HexCoord> = self
                .terrain
                .owned_tiles()
                .filter(|t| t.power == 0 && t.links.is_empty())
                .map(|t| t.coord)
                .collect();
            for coord in dead_ends {
                if let Some(owner) = self.clear_tile(coord) {
                    lost.entry(owner).or_default().push(coord);
                    changed = true;
                }
            }

            changed |= self.prune_dangling_links() > 0;

            if !changed {
                break;
            }
        }

        lost.into_iter()
            .filter(|(_, locations)| !locations.is_empty())
            .map(|(camp, mut locations)| {
                locations.sort();
                debug!(camp, count = locations.len(), "tiles disconnected");
                GameEvent::TilesDisconnected { camp, locations }
            })
            .collect()
    }

    fn end_turn(&mut self) -> Vec<GameEvent> {
        let camp = self.turn;
        let next_camp = (camp + 1) % self.camps.len() as CampId;
        self.turn = next_camp;
        self.turn_number += 1;

        let mut events = vec![GameEvent::TurnEnded { camp, next_camp }];
        events.extend(self.check_win_condition());
        events
    }

    /// Rank camps by a counter, highest first (ties keep id order)
    fn ranked_by<F>(&self, key: F) -> Vec<CampId>
    where
        F: Fn(&Camp) -> u32,
    {
        let mut ranked: Vec<&Camp> = self.camps.iter().collect();
        ranked.sort_by_key(|camp| Reverse(key(camp)));
        ranked.into_iter().map(|camp| camp.id).collect()
    }

    fn check_win_condition(&mut self) -> Vec<GameEvent> {
        if self.game_over.is_some() {
            return Vec::new();
        }

        let over = if self.camps.iter().any(Camp::is_wiped_out) {
            Some(GameOver {
                winners: self.ranked_by(|camp| camp.tiles),
                victory: VictoryType::Supremacy,
            })
        } else {
            let threshold = (self.total_resources() / 2).max(1);
            if self.camps.iter().any(|camp| camp.resources >= threshold) {
                Some(GameOver {
                    winners: self.ranked_by(|camp| camp.resources),
                    victory: VictoryType::Economic,
                })
            } else {
                None
            }
        };

        match over {
            Some(over) => {
                info!(winners = ?over.winners, victory = ?over.victory, "game over");
                self.game_over = Some(over.clone());
                vec![GameEvent::GameWon {
                    winners: over.winners,
                    victory: over.victory,
                }]
            }
            None => Vec::new(),
        }
    }

    /// Flatten the visible state into JSON-friendly arrays (for renderers)
    pub fn to_json_friendly(&self) -> ConquestJson {
        let mut coords: Vec<HexCoord> = self.visible.iter().copied().collect();
        coords.sort();
        ConquestJson {
            turn: self.turn,
            turn_number: self.turn_number,
            camps: self.camps.clone(),
            game_over: self.game_over.clone(),
            total_resources: self.total_resources(),
            tiles: coords
                .into_iter()
                .map(|c| self.terrain.peek(c).into_owned())
                .collect(),
        }
    }
}

/// JSON-friendly snapshot of a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConquestJson {
    pub turn: CampId,
    pub turn_number: u32,
    pub camps: Vec<Camp>,
    pub game_over: Option<GameOver>,
    pub total_resources: u32,
    /// Visible tiles, in coordinate order
    pub tiles: Vec<Tile>,
}
