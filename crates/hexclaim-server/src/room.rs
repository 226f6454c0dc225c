//! Rooms: seats, the hosted conquest, and bot turns.

use hexclaim_core::{
    Bot, BotDifficulty, CampId, Conquest, GameConfig, GameError, GameOver, HexCoord, Move,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{RoomPhase, RoomView, SeatView, Turn};

const MAX_SEATS: u8 = 4;
const MAX_BOTS: u8 = 4;
/// Largest hexagon a single reveal may add
pub const MAX_REVEAL_RADIUS: u32 = 12;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,

    #[error("Not in a room")]
    NotInRoom,

    #[error("Already in a room")]
    AlreadyInRoom,

    #[error("Only the host can do that")]
    NotHost,

    #[error("Game already started")]
    AlreadyStarted,

    #[error("Game not started")]
    NotStarted,

    #[error("A game needs at least two camps")]
    NotEnoughCamps,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Could not set up the game: {0}")]
    Setup(GameError),

    #[error("Move rejected: {0}")]
    Rejected(GameError),
}

/// Whoever plays a camp. The seat's index is the camp id.
pub enum Seat {
    Human { id: Uuid, name: String },
    Bot { name: String, bot: Bot },
}

impl Seat {
    fn player(&self) -> Option<Uuid> {
        match self {
            Seat::Human { id, .. } => Some(*id),
            Seat::Bot { .. } => None,
        }
    }

    fn name(&self) -> &str {
        match self {
            Seat::Human { name, .. } | Seat::Bot { name, .. } => name,
        }
    }
}

pub struct GameRoom {
    pub id: Uuid,
    pub host: Uuid,
    open_seats: u8,
    bot_count: u8,
    seats: Vec<Seat>,
    game: Option<Conquest>,
}

impl GameRoom {
    pub fn open(id: Uuid, host: Uuid, host_name: String, seats: u8, bots: u8) -> Self {
        Self {
            id,
            host,
            open_seats: seats.clamp(1, MAX_SEATS),
            bot_count: bots.min(MAX_BOTS),
            seats: vec![Seat::Human {
                id: host,
                name: host_name,
            }],
            game: None,
        }
    }

    pub fn game(&self) -> Option<&Conquest> {
        self.game.as_ref()
    }

    pub fn phase(&self) -> RoomPhase {
        match &self.game {
            None => RoomPhase::Lobby,
            Some(game) if game.is_finished() => RoomPhase::Finished,
            Some(_) => RoomPhase::Playing,
        }
    }

    /// Players still seated, in camp order
    pub fn members(&self) -> Vec<Uuid> {
        self.seats.iter().filter_map(Seat::player).collect()
    }

    /// No human holds a seat any more
    pub fn is_abandoned(&self) -> bool {
        self.seats.iter().all(|seat| seat.player().is_none())
    }

    fn camp_of(&self, player: Uuid) -> Option<CampId> {
        self.seats
            .iter()
            .position(|seat| seat.player() == Some(player))
            .map(|index| index as CampId)
    }

    pub fn join(&mut self, player: Uuid, name: String) -> Result<(), RoomError> {
        if self.game.is_some() {
            return Err(RoomError::AlreadyStarted);
        }
        if self.seats.len() >= self.open_seats as usize {
            return Err(RoomError::RoomFull);
        }
        self.seats.push(Seat::Human { id: player, name });
        Ok(())
    }

    /// Give up a seat. In the lobby the seat goes away; once the game runs a
    /// bot takes over the camp, and any turns it then plays are returned.
    pub fn leave(&mut self, player: Uuid) -> Result<Vec<Turn>, RoomError> {
        let camp = self.camp_of(player).ok_or(RoomError::NotInRoom)?;
        let index = camp as usize;

        let turns = if self.game.is_none() {
            self.seats.remove(index);
            Vec::new()
        } else {
            let name = format!("{} (bot)", self.seats[index].name());
            info!(room = %self.id, camp, "bot takes over seat");
            self.seats[index] = Seat::Bot {
                name,
                bot: Bot::new(camp, BotDifficulty::Medium),
            };
            self.play_bots()
        };

        if player == self.host {
            if let Some(next) = self.members().first() {
                self.host = *next;
            }
        }
        Ok(turns)
    }

    /// Deal bot seats and set up the world; bots to move first play at once
    pub fn start(
        &mut self,
        requester: Uuid,
        view_radius: u32,
        seed: Option<u64>,
    ) -> Result<Vec<Turn>, RoomError> {
        if requester != self.host {
            return Err(RoomError::NotHost);
        }
        if self.game.is_some() {
            return Err(RoomError::AlreadyStarted);
        }
        let camps = self.seats.len() as u8 + self.bot_count;
        if camps < 2 {
            return Err(RoomError::NotEnoughCamps);
        }

        let config = GameConfig {
            camps,
            seed,
            ..GameConfig::default()
        };
        let mut game = Conquest::new(config, HexCoord::default().within(view_radius))
            .map_err(RoomError::Setup)?;

        let humans = self.seats.len() as u8;
        for (n, camp) in (humans..camps).enumerate() {
            let bot = match seed {
                Some(seed) => Bot::with_seed(
                    camp,
                    BotDifficulty::Medium,
                    seed.wrapping_add(camp as u64),
                ),
                None => Bot::new(camp, BotDifficulty::Medium),
            };
            self.seats.push(Seat::Bot {
                name: format!("Bot {}", n + 1),
                bot,
            });
        }
        game.set_camp_names(self.seats.iter().map(|s| s.name().to_string()).collect());
        info!(room = %self.id, camps, "game started");

        self.game = Some(game);
        Ok(self.play_bots())
    }

    /// Play a human move, then any bot turns that follow it
    pub fn submit(&mut self, player: Uuid, mv: Move) -> Result<Vec<Turn>, RoomError> {
        let camp = self.camp_of(player).ok_or(RoomError::NotInRoom)?;
        let game = self.game.as_mut().ok_or(RoomError::NotStarted)?;
        if game.turn() != camp {
            return Err(RoomError::NotYourTurn);
        }

        debug!(room = %self.id, camp, origin = ?mv.origin(), ?mv, "move submitted");
        let events = game.apply_move(&mv).map_err(RoomError::Rejected)?;

        let mut turns = vec![Turn { camp, events }];
        turns.extend(self.play_bots());
        Ok(turns)
    }

    /// Reveal a hexagon around `center`, capped at [`MAX_REVEAL_RADIUS`].
    /// Returns how many tiles became visible.
    pub fn reveal(
        &mut self,
        player: Uuid,
        center: HexCoord,
        radius: u32,
    ) -> Result<usize, RoomError> {
        self.camp_of(player).ok_or(RoomError::NotInRoom)?;
        let game = self.game.as_mut().ok_or(RoomError::NotStarted)?;

        let before = game.visible().len();
        game.reveal(center.within(radius.min(MAX_REVEAL_RADIUS)));
        Ok(game.visible().len() - before)
    }

    /// Bot seats move until a human is up or the game is decided.
    /// An abandoned room stops here, so bots never play among themselves forever.
    fn play_bots(&mut self) -> Vec<Turn> {
        let mut turns = Vec::new();
        if self.is_abandoned() {
            return turns;
        }
        let Some(game) = self.game.as_mut() else {
            return turns;
        };

        while !game.is_finished() {
            let camp = game.turn();
            let Some(Seat::Bot { bot, .. }) = self.seats.get_mut(camp as usize) else {
                break;
            };
            let mv = bot.choose_move(game).unwrap_or(Move::Pass);
            debug!(room = %self.id, camp, origin = ?mv.origin(), ?mv, "bot move");

            let events = match game.apply_move(&mv) {
                Ok(events) => events,
                Err(error) => {
                    warn!(room = %self.id, camp, %error, "bot move rejected, passing");
                    game.apply_move(&Move::Pass).unwrap_or_default()
                }
            };
            turns.push(Turn { camp, events });
        }
        turns
    }

    pub fn snapshot(&self) -> Option<serde_json::Value> {
        self.game
            .as_ref()
            .and_then(|g| serde_json::to_value(g.to_json_friendly()).ok())
    }

    /// Final ranking with the name of the top camp
    pub fn outcome(&self) -> Option<(GameOver, String)> {
        let game = self.game.as_ref()?;
        let over = game.game_over()?;
        let top = *over.winners.first()?;
        Some((over.clone(), game.camp(top)?.name.clone()))
    }

    pub fn view(&self) -> RoomView {
        RoomView {
            id: self.id,
            host: self.host,
            seats: self
                .seats
                .iter()
                .map(|seat| SeatView {
                    name: seat.name().to_string(),
                    player: seat.player(),
                })
                .collect(),
            open_seats: self.open_seats,
            bots: self.bot_count,
            phase: self.phase(),
        }
    }
}
