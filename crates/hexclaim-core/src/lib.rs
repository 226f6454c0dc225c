//! Hexclaim - elemental territory conquest on an infinite hex grid
//!
//! This crate provides the core rules engine for Hexclaim, including:
//! - Axial hex coordinates and the six neighbor directions
//! - Procedural terrain generated lazily from a world seed
//! - Element movement patterns (Earth, Fire, Air, Water)
//! - The territory graph: captures, pressure, and the disconnection sweep
//! - Turn order and win conditions
//!
//! # Architecture
//!
//! The engine is platform-agnostic. It can be compiled to:
//! - Native Rust for server-side game hosting
//! - WebAssembly for client-side play
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system and `"q:r"` keys
//! - [`terrain`]: Elements, tiles, and the lazy terrain store
//! - [`reach`]: Which tiles each element can reach
//! - [`camp`]: Camps and base selection
//! - [`actions`]: Moves and the events they produce
//! - [`game`]: Conquest state machine
//! - [`bot`]: Opponent heuristic

pub mod actions;
pub mod bot;
pub mod camp;
pub mod game;
pub mod hex;
pub mod reach;
pub mod terrain;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{GameEvent, Move};
pub use bot::{choose_move, Bot, BotDifficulty};
pub use camp::{Camp, CampId};
pub use game::{Conquest, ConquestJson, GameConfig, GameError, GameOver, Submission, VictoryType};
pub use hex::{Direction, HexCoord, KeyError};
pub use reach::{reachable, Reach};
pub use terrain::{Element, Terrain, Tile};
