//! AI opponents for Hexclaim.
//!
//! This module provides the scoring heuristic that picks a move for a camp, and
//! `Bot`, which wraps it with a difficulty level:
//! - Easy: a random accessible move
//! - Medium: the best-scoring move

use crate::actions::Move;
use crate::camp::CampId;
use crate::game::Conquest;
use crate::hex::HexCoord;
use crate::reach::Reach;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Score for landing on a resource
const RESOURCE_SCORE: i32 = 10;
/// Score for attacking a tile weaker than the origin
const SAFE_ATTACK_SCORE: i32 = 7;
/// Score for attacking a tile at least as strong as the origin
const RISKY_ATTACK_SCORE: i32 = 1;
/// Score for landing on the origin's transition element
const TRANSITION_SCORE: i32 = 6;
/// Score for reaching past the direct neighbors
const REACH_SCORE: i32 = 2;

/// A candidate move and its score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredMove {
    pub origin: HexCoord,
    pub destination: HexCoord,
    pub score: i32,
}

/// Score one accessible move of `camp` from `origin`
pub fn score_move(game: &Conquest, camp: CampId, origin: HexCoord, reach: &Reach) -> i32 {
    let from = game.tile(origin);
    let to = game.tile(reach.destination);
    let mut score = 0;

    if to.has_resource {
        score += RESOURCE_SCORE;
    }
    if to.owner.is_some() && to.owner != Some(camp) {
        score += if from.power > to.power {
            SAFE_ATTACK_SCORE
        } else {
            RISKY_ATTACK_SCORE
        };
    }
    if from.element.flows_into(to.element) {
        score += TRANSITION_SCORE;
    }
    if !origin.is_neighbor_of(&reach.destination) {
        score += REACH_SCORE;
    }
    score
}

/// Every accessible move of `camp` with its score, tiles in coordinate order
pub fn scored_moves(game: &Conquest, camp: CampId) -> Vec<ScoredMove> {
    game.owned_tiles(camp)
        .into_iter()
        .flat_map(|origin| {
            game.accessible_moves(origin)
                .into_iter()
                .map(move |reach| ScoredMove {
                    origin,
                    destination: reach.destination,
                    score: score_move(game, camp, origin, &reach),
                })
        })
        .collect()
}

/// The best-scoring move for `camp`; ties go to the first one found.
///
/// Returns `None` when the camp has nowhere to go.
pub fn choose_move(game: &Conquest, camp: CampId) -> Option<Move> {
    let mut best: Option<ScoredMove> = None;
    for option in scored_moves(game, camp) {
        if best.as_ref().map_or(true, |b| option.score > b.score) {
            best = Some(option);
        }
    }
    best.map(|b| Move::advance(b.origin, b.destination))
}

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotDifficulty {
    Easy,
    Medium,
}

/// A bot camp that decides on moves
pub struct Bot {
    pub camp: CampId,
    pub difficulty: BotDifficulty,
    rng: StdRng,
}

impl Bot {
    pub fn new(camp: CampId, difficulty: BotDifficulty) -> Self {
        Self {
            camp,
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(camp: CampId, difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            camp,
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose a move, or `None` when it is not this bot's turn
    pub fn choose_move(&mut self, game: &Conquest) -> Option<Move> {
        if game.is_finished() || game.turn() != self.camp {
            return None;
        }

        let chosen = match self.difficulty {
            BotDifficulty::Easy => self.choose_easy(game),
            BotDifficulty::Medium => choose_move(game, self.camp),
        };
        Some(chosen.unwrap_or(Move::Pass))
    }

    /// Easy: just pick a random accessible move
    fn choose_easy(&mut self, game: &Conquest) -> Option<Move> {
        scored_moves(game, self.camp)
            .choose(&mut self.rng)
            .map(|m| Move::advance(m.origin, m.destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::terrain::{Element, Terrain};

    fn hex(q: i32, r: i32) -> HexCoord {
        HexCoord::new(q, r)
    }

    fn game(layout: Vec<(HexCoord, Element)>, bases: Vec<HexCoord>) -> Conquest {
        Conquest::with_bases(
            GameConfig::default(),
            Terrain::with_layout(8, layout),
            hex(0, 0).within(4),
            bases,
        )
        .unwrap()
    }

    #[test]
    fn test_prefers_resources() {
        // (0,-1) is a resource tile next to the Earth base.
        let layout = vec![
            (hex(0, 0), Element::Earth),
            (hex(-3, 3), Element::Earth),
            (hex(0, -1), Element::Earth),
        ];
        let game = game(layout, vec![hex(0, 0), hex(-3, 3)]);
        assert_eq!(choose_move(&game, 0), Some(Move::advance(hex(0, 0), hex(0, -1))));
    }

    #[test]
    fn test_scores_transition_and_reach() {
        // Fire base: the far north-east tile is Air, two steps out.
        let layout = vec![
            (hex(0, 0), Element::Fire),
            (hex(-3, 3), Element::Earth),
            (hex(1, -1), Element::Earth),
            (hex(2, -2), Element::Air),
        ];
        let game = game(layout, vec![hex(0, 0), hex(-3, 3)]);
        let options = scored_moves(&game, 0);

        let far = options.iter().find(|o| o.destination == hex(2, -2)).unwrap();
        assert_eq!(far.score, TRANSITION_SCORE + REACH_SCORE);
        let near = options.iter().find(|o| o.destination == hex(1, -1)).unwrap();
        assert_eq!(near.score, 0);
    }

    #[test]
    fn test_attack_scores_depend_on_power() {
        let layout = vec![(hex(0, 0), Element::Earth), (hex(1, 0), Element::Earth)];
        let game = game(layout, vec![hex(0, 0), hex(1, 0)]);
        let reach = game
            .accessible_moves(hex(0, 0))
            .into_iter()
            .find(|r| r.destination == hex(1, 0))
            .unwrap();
        // Equal power: risky
        assert_eq!(score_move(&game, 0, hex(0, 0), &reach), RISKY_ATTACK_SCORE);
    }

    #[test]
    fn test_ties_go_to_first_option() {
        let layout = vec![(hex(0, 0), Element::Earth), (hex(-3, 3), Element::Earth)];
        let game = game(layout, vec![hex(0, 0), hex(-3, 3)]);
        let options = scored_moves(&game, 0);
        let best = options.iter().map(|o| o.score).max().unwrap();
        let first = options.iter().find(|o| o.score == best).unwrap();
        assert_eq!(
            choose_move(&game, 0),
            Some(Move::advance(first.origin, first.destination))
        );
    }

    #[test]
    fn test_bot_waits_for_its_turn() {
        let layout = vec![(hex(0, 0), Element::Earth), (hex(-3, 3), Element::Earth)];
        let game = game(layout, vec![hex(0, 0), hex(-3, 3)]);

        let mut other = Bot::with_seed(1, BotDifficulty::Medium, 1);
        assert_eq!(other.choose_move(&game), None);

        let mut easy = Bot::with_seed(0, BotDifficulty::Easy, 1);
        let mv = easy.choose_move(&game).unwrap();
        assert!(game.is_valid_move(&mv));
    }

    #[test]
    fn test_bot_passes_when_stuck() {
        // A single visible tile: the base has nowhere to go.
        let game = Conquest::with_bases(
            GameConfig::default(),
            Terrain::with_seed(3),
            [hex(0, 0), hex(5, 5)],
            vec![hex(0, 0), hex(5, 5)],
        )
        .unwrap();
        let mut bot = Bot::with_seed(0, BotDifficulty::Medium, 1);
        assert_eq!(bot.choose_move(&game), Some(Move::Pass));
    }
}
