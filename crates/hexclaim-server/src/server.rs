//! WebSocket server: sessions, request handling, and room broadcasts.

use crate::protocol::{ClientMessage, ServerMessage, Turn};
use crate::room::{GameRoom, RoomError};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use hexclaim_core::{HexCoord, Move};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Visible radius used when none is configured
pub const DEFAULT_VIEW_RADIUS: u32 = 6;

/// One connected player
struct Session {
    outbox: mpsc::UnboundedSender<ServerMessage>,
    room: Option<Uuid>,
}

pub struct ServerState {
    rooms: DashMap<Uuid, GameRoom>,
    sessions: DashMap<Uuid, Session>,
    /// Radius of the visible hexagon every game starts with
    view_radius: u32,
}

impl ServerState {
    pub fn new(view_radius: u32) -> Self {
        Self {
            rooms: DashMap::new(),
            sessions: DashMap::new(),
            view_radius,
        }
    }

    /// Register a new session and hand back its id and outgoing queue
    fn connect(&self) -> (Uuid, mpsc::UnboundedReceiver<ServerMessage>) {
        let player_id = Uuid::new_v4();
        let (outbox, rx) = mpsc::unbounded_channel();
        self.sessions.insert(player_id, Session { outbox, room: None });
        (player_id, rx)
    }

    fn send(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(session) = self.sessions.get(&player_id) {
            let _ = session.outbox.send(msg);
        }
    }

    fn broadcast(&self, room_id: Uuid, msg: ServerMessage) {
        let members = match self.rooms.get(&room_id) {
            Some(room) => room.members(),
            None => return,
        };
        for player_id in members {
            self.send(player_id, msg.clone());
        }
    }

    fn room_of(&self, player_id: Uuid) -> Option<Uuid> {
        self.sessions.get(&player_id).and_then(|s| s.room)
    }

    fn set_room(&self, player_id: Uuid, room: Option<Uuid>) {
        if let Some(mut session) = self.sessions.get_mut(&player_id) {
            session.room = room;
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_RADIUS)
    }
}

pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Hexclaim server listening on {}", addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, state).await {
                error!(%peer, "connection error: {}", e);
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (player_id, rx) = state.connect();
    info!(%peer, %player_id, "player connected");

    state.send(player_id, ServerMessage::Welcome { player_id });
    let outcome = pump(ws_stream, player_id, rx, &state).await;

    handle_disconnect(player_id, &state);
    info!(%player_id, "player disconnected");
    outcome
}

/// Move messages both ways until either side closes
async fn pump(
    ws_stream: tokio_tungstenite::WebSocketStream<TcpStream>,
    player_id: Uuid,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    state: &ServerState,
) -> anyhow::Result<()> {
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        tokio::select! {
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => handle_message(player_id, msg, state),
                    Err(e) => {
                        warn!(%player_id, "unreadable message: {}", e);
                        state.send(player_id, ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        });
                    }
                },
                Some(Ok(Message::Close(_))) | None => return Ok(()),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
            outgoing = rx.recv() => match outgoing {
                Some(msg) => {
                    let text = serde_json::to_string(&msg)?;
                    ws_sender.send(Message::Text(text)).await?;
                }
                None => return Ok(()),
            },
        }
    }
}

fn handle_message(player_id: Uuid, msg: ClientMessage, state: &ServerState) {
    let handled = match msg {
        ClientMessage::CreateRoom {
            player_name,
            seats,
            bots,
        } => create_room(state, player_id, player_name, seats, bots),
        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => join_room(state, player_id, room_id, player_name),
        ClientMessage::LeaveRoom => leave_room(state, player_id),
        ClientMessage::StartGame { seed } => start_game(state, player_id, seed),
        ClientMessage::SubmitMove { mv } => submit_move(state, player_id, mv),
        ClientMessage::Reveal { center, radius } => reveal(state, player_id, center, radius),
        ClientMessage::Ping => {
            state.send(player_id, ServerMessage::Pong);
            Ok(())
        }
    };

    if let Err(e) = handled {
        debug!(%player_id, "request refused: {}", e);
        state.send(player_id, ServerMessage::Error { message: e.to_string() });
    }
}

fn create_room(
    state: &ServerState,
    player_id: Uuid,
    player_name: String,
    seats: u8,
    bots: u8,
) -> Result<(), RoomError> {
    if state.room_of(player_id).is_some() {
        return Err(RoomError::AlreadyInRoom);
    }
    let room_id = Uuid::new_v4();
    let room = GameRoom::open(room_id, player_id, player_name, seats, bots);
    let view = room.view();

    state.rooms.insert(room_id, room);
    state.set_room(player_id, Some(room_id));
    info!(%room_id, %player_id, "room opened");
    state.send(player_id, ServerMessage::Lobby { room: view });
    Ok(())
}

fn join_room(
    state: &ServerState,
    player_id: Uuid,
    room_id: Uuid,
    player_name: String,
) -> Result<(), RoomError> {
    if state.room_of(player_id).is_some() {
        return Err(RoomError::AlreadyInRoom);
    }
    let view = {
        let mut room = state.rooms.get_mut(&room_id).ok_or(RoomError::RoomNotFound)?;
        room.join(player_id, player_name)?;
        room.view()
    };

    state.set_room(player_id, Some(room_id));
    state.broadcast(room_id, ServerMessage::Lobby { room: view });
    Ok(())
}

fn leave_room(state: &ServerState, player_id: Uuid) -> Result<(), RoomError> {
    let room_id = state.room_of(player_id).ok_or(RoomError::NotInRoom)?;
    state.set_room(player_id, None);
    vacate(state, room_id, player_id);
    state.send(player_id, ServerMessage::LeftRoom);
    Ok(())
}

fn start_game(state: &ServerState, player_id: Uuid, seed: Option<u64>) -> Result<(), RoomError> {
    let room_id = state.room_of(player_id).ok_or(RoomError::NotInRoom)?;
    let (turns, view) = {
        let mut room = state.rooms.get_mut(&room_id).ok_or(RoomError::RoomNotFound)?;
        let turns = room.start(player_id, state.view_radius, seed)?;
        (turns, room.view())
    };

    state.broadcast(room_id, ServerMessage::Lobby { room: view });
    publish(state, room_id, turns);
    Ok(())
}

fn submit_move(state: &ServerState, player_id: Uuid, mv: Move) -> Result<(), RoomError> {
    let room_id = state.room_of(player_id).ok_or(RoomError::NotInRoom)?;
    let turns = state
        .rooms
        .get_mut(&room_id)
        .ok_or(RoomError::RoomNotFound)?
        .submit(player_id, mv)?;

    publish(state, room_id, turns);
    Ok(())
}

fn reveal(
    state: &ServerState,
    player_id: Uuid,
    center: HexCoord,
    radius: u32,
) -> Result<(), RoomError> {
    let room_id = state.room_of(player_id).ok_or(RoomError::NotInRoom)?;
    let added = state
        .rooms
        .get_mut(&room_id)
        .ok_or(RoomError::RoomNotFound)?
        .reveal(player_id, center, radius)?;

    debug!(%room_id, %center, added, "tiles revealed");
    if added > 0 {
        publish(state, room_id, Vec::new());
    }
    Ok(())
}

/// Send the room what changed: played turns, the new snapshot, and the result
/// when one of the turns decided the game
fn publish(state: &ServerState, room_id: Uuid, turns: Vec<Turn>) {
    let (snapshot, outcome) = match state.rooms.get(&room_id) {
        Some(room) => (room.snapshot(), room.outcome()),
        None => return,
    };
    let decided = turns.iter().any(|t| t.decided().is_some());

    if !turns.is_empty() {
        state.broadcast(room_id, ServerMessage::Played { turns });
    }
    if let Some(snapshot) = snapshot {
        state.broadcast(room_id, ServerMessage::Snapshot { state: snapshot });
    }
    if let (true, Some((over, winner_name))) = (decided, outcome) {
        info!(%room_id, %winner_name, victory = ?over.victory, "game over");
        state.broadcast(
            room_id,
            ServerMessage::GameOver {
                winners: over.winners,
                winner_name,
                victory: over.victory,
            },
        );
    }
}

/// Take `player_id` out of the room, closing it once no human is left
fn vacate(state: &ServerState, room_id: Uuid, player_id: Uuid) {
    let (turns, view) = {
        let Some(mut room) = state.rooms.get_mut(&room_id) else {
            return;
        };
        let turns = room.leave(player_id).unwrap_or_default();
        if room.is_abandoned() {
            drop(room);
            state.rooms.remove(&room_id);
            info!(%room_id, "room closed");
            return;
        }
        (turns, room.view())
    };

    state.broadcast(room_id, ServerMessage::Lobby { room: view });
    if !turns.is_empty() {
        publish(state, room_id, turns);
    }
}

fn handle_disconnect(player_id: Uuid, state: &ServerState) {
    if let Some(room_id) = state.room_of(player_id) {
        vacate(state, room_id, player_id);
    }
    state.sessions.remove(&player_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RoomPhase;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    fn open_room(state: &ServerState, host: Uuid, seats: u8, bots: u8) -> Uuid {
        handle_message(
            host,
            ClientMessage::CreateRoom {
                player_name: "Host".to_string(),
                seats,
                bots,
            },
            state,
        );
        state.room_of(host).expect("room opened")
    }

    #[test]
    fn test_solo_game_against_a_bot() {
        let state = ServerState::default();
        let (host, mut rx) = state.connect();
        open_room(&state, host, 1, 1);
        assert!(matches!(drain(&mut rx)[0], ServerMessage::Lobby { .. }));

        handle_message(host, ClientMessage::StartGame { seed: Some(5) }, &state);
        let messages = drain(&mut rx);
        match &messages[0] {
            ServerMessage::Lobby { room } => assert_eq!(room.phase, RoomPhase::Playing),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(messages[1], ServerMessage::Snapshot { .. }));

        handle_message(host, ClientMessage::SubmitMove { mv: Move::Pass }, &state);
        let messages = drain(&mut rx);
        match &messages[0] {
            ServerMessage::Played { turns } => {
                assert_eq!(turns[0].camp, 0);
                assert!(turns.len() <= 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(messages[1], ServerMessage::Snapshot { .. }));
    }

    #[test]
    fn test_refusals_come_back_as_errors() {
        let state = ServerState::default();
        let (player, mut rx) = state.connect();

        handle_message(player, ClientMessage::SubmitMove { mv: Move::Pass }, &state);
        handle_message(
            player,
            ClientMessage::JoinRoom {
                room_id: Uuid::new_v4(),
                player_name: "Lost".to_string(),
            },
            &state,
        );
        let errors: Vec<String> = drain(&mut rx)
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::Error { message } => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(errors, vec!["Not in a room", "Room not found"]);

        open_room(&state, player, 2, 0);
        handle_message(player, ClientMessage::StartGame { seed: None }, &state);
        assert!(drain(&mut rx).iter().any(|m| matches!(
            m,
            ServerMessage::Error { message } if message.contains("two camps")
        )));
    }

    #[test]
    fn test_reveal_sends_a_fresh_snapshot() {
        let state = ServerState::default();
        let (host, mut rx) = state.connect();
        open_room(&state, host, 1, 1);
        handle_message(host, ClientMessage::StartGame { seed: Some(9) }, &state);
        drain(&mut rx);

        handle_message(
            host,
            ClientMessage::Reveal {
                center: HexCoord::new(0, 0),
                radius: 2,
            },
            &state,
        );
        assert!(drain(&mut rx).is_empty());

        handle_message(
            host,
            ClientMessage::Reveal {
                center: HexCoord::new(0, 0),
                radius: DEFAULT_VIEW_RADIUS + 2,
            },
            &state,
        );
        match drain(&mut rx).pop() {
            Some(ServerMessage::Snapshot { state }) => {
                assert_eq!(state["tiles"].as_array().map(Vec::len), Some(217));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_disconnect_hands_seat_to_a_bot() {
        let state = ServerState::default();
        let (host, mut host_rx) = state.connect();
        let (guest, _guest_rx) = state.connect();
        let room_id = open_room(&state, host, 2, 0);

        handle_message(
            guest,
            ClientMessage::JoinRoom {
                room_id,
                player_name: "Guest".to_string(),
            },
            &state,
        );
        handle_message(host, ClientMessage::StartGame { seed: Some(6) }, &state);
        drain(&mut host_rx);

        handle_disconnect(guest, &state);
        match drain(&mut host_rx).first() {
            Some(ServerMessage::Lobby { room }) => assert_eq!(room.seats[1].player, None),
            other => panic!("unexpected {:?}", other),
        }

        handle_message(host, ClientMessage::SubmitMove { mv: Move::Pass }, &state);
        assert!(drain(&mut host_rx)
            .iter()
            .any(|m| matches!(m, ServerMessage::Played { turns } if turns[0].camp == 0)));

        handle_message(host, ClientMessage::LeaveRoom, &state);
        assert!(matches!(drain(&mut host_rx).pop(), Some(ServerMessage::LeftRoom)));
        assert!(state.rooms.is_empty());
    }
}
