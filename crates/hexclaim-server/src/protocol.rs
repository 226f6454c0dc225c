//! JSON messages exchanged over the WebSocket.
//!
//! Every message is an adjacently tagged object: `{"type": ..., "payload": ...}`.

use hexclaim_core::{CampId, GameEvent, HexCoord, Move, VictoryType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Open a room with `seats` human seats; `bots` computer camps join at start
    CreateRoom {
        player_name: String,
        seats: u8,
        #[serde(default)]
        bots: u8,
    },
    JoinRoom { room_id: Uuid, player_name: String },
    LeaveRoom,
    /// Host only. A fixed seed replays the same world.
    StartGame {
        #[serde(default)]
        seed: Option<u64>,
    },
    SubmitMove { mv: Move },
    /// Grow the visible region by a hexagon around `center`
    Reveal { center: HexCoord, radius: u32 },
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    Welcome { player_id: Uuid },
    /// Seats or phase of the sender's room changed
    Lobby { room: RoomView },
    LeftRoom,
    /// Visible game state, sent after every change
    Snapshot { state: serde_json::Value },
    /// Turns played since the last snapshot, bots included
    Played { turns: Vec<Turn> },
    GameOver {
        winners: Vec<CampId>,
        winner_name: String,
        victory: VictoryType,
    },
    Error { message: String },
    Pong,
}

/// One camp's move and what it caused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub camp: CampId,
    pub events: Vec<GameEvent>,
}

impl Turn {
    /// The ranking, if this turn decided the game
    pub fn decided(&self) -> Option<(&[CampId], VictoryType)> {
        self.events.iter().find_map(|event| match event {
            GameEvent::GameWon { winners, victory } => Some((winners.as_slice(), *victory)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomView {
    pub id: Uuid,
    pub host: Uuid,
    /// Seat index is the camp id once the game starts
    pub seats: Vec<SeatView>,
    pub open_seats: u8,
    pub bots: u8,
    pub phase: RoomPhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatView {
    pub name: String,
    /// `None` for a bot seat
    pub player: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Lobby,
    Playing,
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages_parse() {
        let text = r#"{"type":"CreateRoom","payload":{"player_name":"Ana","seats":2}}"#;
        match serde_json::from_str::<ClientMessage>(text).unwrap() {
            ClientMessage::CreateRoom { seats, bots, .. } => assert_eq!((seats, bots), (2, 0)),
            other => panic!("unexpected {:?}", other),
        }

        let text = r#"{"type":"StartGame","payload":{}}"#;
        assert!(matches!(
            serde_json::from_str::<ClientMessage>(text).unwrap(),
            ClientMessage::StartGame { seed: None }
        ));

        let text = r#"{"type":"Reveal","payload":{"center":{"q":3,"r":-1},"radius":2}}"#;
        match serde_json::from_str::<ClientMessage>(text).unwrap() {
            ClientMessage::Reveal { center, radius } => {
                assert_eq!(center, HexCoord::new(3, -1));
                assert_eq!(radius, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_submit_move_shape() {
        let mv = ClientMessage::SubmitMove {
            mv: Move::advance(HexCoord::new(0, 0), HexCoord::new(1, 0)),
        };
        let json = serde_json::to_value(&mv).unwrap();
        assert_eq!(json["type"], "SubmitMove");
        assert_eq!(json["payload"]["mv"]["Advance"]["destination"]["q"], 1);

        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(json, r#"{"type":"Pong"}"#);
    }

    #[test]
    fn test_turn_reports_a_decided_game() {
        let quiet = Turn {
            camp: 0,
            events: vec![GameEvent::TurnPassed { camp: 0 }],
        };
        assert!(quiet.decided().is_none());

        let decisive = Turn {
            camp: 1,
            events: vec![GameEvent::GameWon {
                winners: vec![1, 0],
                victory: VictoryType::Supremacy,
            }],
        };
        assert_eq!(
            decisive.decided(),
            Some((&[1, 0][..], VictoryType::Supremacy))
        );
    }
}
