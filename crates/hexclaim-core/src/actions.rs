//! Moves that camps submit and the events they produce.
//!
//! This module defines all possible moves in the game and the events
//! that result from those moves.

use crate::camp::CampId;
use crate::game::VictoryType;
use crate::hex::HexCoord;
use crate::terrain::Element;
use serde::{Deserialize, Serialize};

/// All possible moves a camp can submit on its turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    /// Extend the territory graph from `origin` towards `destination`
    Advance {
        origin: HexCoord,
        destination: HexCoord,
    },
    /// Fortify an owned tile with an element
    Build { origin: HexCoord, element: Element },
    /// Give up the turn
    Pass,
}

impl Move {
    /// Create an advance move
    pub fn advance(origin: HexCoord, destination: HexCoord) -> Self {
        Move::Advance {
            origin,
            destination,
        }
    }

    /// Create a build move
    pub fn build(origin: HexCoord, element: Element) -> Self {
        Move::Build { origin, element }
    }

    /// The tile the move starts from, if any
    pub fn origin(&self) -> Option<HexCoord> {
        match self {
            Move::Advance { origin, .. } | Move::Build { origin, .. } => Some(*origin),
            Move::Pass => None,
        }
    }
}

/// Events that occur as a result of moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A tile changed hands
    TileCaptured {
        camp: CampId,
        /// Previous holder, if the tile was not free
        from: Option<CampId>,
        location: HexCoord,
        /// Waypoints claimed on the way
        waypoints: Vec<HexCoord>,
        power: u32,
    },

    /// An attack was too weak; the edge stays as pressure on the tile
    LinkProjected {
        camp: CampId,
        origin: HexCoord,
        target: HexCoord,
        /// Summed opposing power on the target after this edge
        pressure: u32,
        /// Power of the tile that held
        defense: u32,
    },

    /// A tile was fortified
    Fortified {
        camp: CampId,
        location: HexCoord,
        element: Element,
    },

    /// Tiles were cut off from their camp's base and cleared
    TilesDisconnected {
        camp: CampId,
        locations: Vec<HexCoord>,
    },

    /// A camp gave up its turn
    TurnPassed { camp: CampId },

    /// Turn ended
    TurnEnded { camp: CampId, next_camp: CampId },

    /// The game was decided
    GameWon {
        winners: Vec<CampId>,
        victory: VictoryType,
    },
}
