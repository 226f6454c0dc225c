//! WebAssembly bindings for the Hexclaim engine.
//!
//! Exposes a `Conquest` to JavaScript. Coordinates cross the boundary as
//! `"q:r"` keys, everything else as JSON strings.

use wasm_bindgen::prelude::*;

use crate::actions::Move;
use crate::bot::{Bot, BotDifficulty};
use crate::game::{Conquest, GameConfig};
use crate::hex::HexCoord;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn parse_key(key: &str) -> Result<HexCoord, JsValue> {
    HexCoord::from_key(key).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmConquest {
    game: Conquest,
}

#[wasm_bindgen]
impl WasmConquest {
    /// Start a game with `camps` camps, revealing a hexagon of `radius` around the origin.
    ///
    /// A `seed` of 0 picks a random world.
    #[wasm_bindgen(constructor)]
    pub fn new(camps: u8, radius: u32, seed: u64) -> Result<WasmConquest, JsValue> {
        let config = GameConfig {
            camps,
            seed: (seed != 0).then_some(seed),
            ..GameConfig::default()
        };
        let game = Conquest::new(config, HexCoord::default().within(radius))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmConquest { game })
    }

    /// Get the visible game state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.game.to_json_friendly()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Camp to move
    #[wasm_bindgen(js_name = getTurn)]
    pub fn get_turn(&self) -> u8 {
        self.game.turn()
    }

    /// Destinations reachable from the tile at `key`, as a JSON array of keys
    #[wasm_bindgen(js_name = getAccessibleMoves)]
    pub fn get_accessible_moves(&self, key: &str) -> Result<String, JsValue> {
        let origin = parse_key(key)?;
        let keys: Vec<String> = self
            .game
            .accessible_moves(origin)
            .into_iter()
            .map(|reach| reach.destination.key())
            .collect();
        Ok(serde_json::to_string(&keys).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Advance from one tile to another; returns the submission as JSON
    #[wasm_bindgen(js_name = advance)]
    pub fn advance(&mut self, origin: &str, destination: &str) -> Result<String, JsValue> {
        let mv = Move::advance(parse_key(origin)?, parse_key(destination)?);
        Ok(self.submit_move(mv))
    }

    /// Submit any move from JSON; returns the submission as JSON
    #[wasm_bindgen(js_name = submitMove)]
    pub fn submit_move_json(&mut self, move_json: &str) -> Result<String, JsValue> {
        let mv: Move = serde_json::from_str(move_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid move JSON: {}", e)))?;
        Ok(self.submit_move(mv))
    }

    /// Reveal a hexagon of `radius` around the tile at `key`
    #[wasm_bindgen(js_name = reveal)]
    pub fn reveal(&mut self, key: &str, radius: u32) -> Result<(), JsValue> {
        let center = parse_key(key)?;
        self.game.reveal(center.within(radius));
        Ok(())
    }

    /// Check if the game is finished
    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.game.is_finished()
    }

    /// Final ranking and victory type as JSON, or `null` while the game runs
    #[wasm_bindgen(js_name = getGameOver)]
    pub fn get_game_over(&self) -> String {
        serde_json::to_string(&self.game.game_over()).unwrap_or_else(|_| "null".to_string())
    }

    /// Get a bot's suggested move for the camp to move.
    /// difficulty: "Easy" or "Medium"
    #[wasm_bindgen(js_name = getBotMove)]
    pub fn get_bot_move(&self, difficulty: &str) -> String {
        let diff = match difficulty {
            "Easy" => BotDifficulty::Easy,
            _ => BotDifficulty::Medium,
        };

        let mut bot = Bot::new(self.game.turn(), diff);
        match bot.choose_move(&self.game) {
            Some(mv) => serde_json::to_string(&mv).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }
}

impl WasmConquest {
    fn submit_move(&mut self, mv: Move) -> String {
        let submission = self.game.submit(mv);
        serde_json::to_string(&submission).unwrap_or_else(|_| "{}".to_string())
    }
}
