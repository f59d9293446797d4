//! WebAssembly bindings for a browser front end.
//!
//! The browser keeps doing the network calls; this module gives it the
//! geometry, the selection rules and the resolver so the page does not
//! branch on card types itself.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::actions::{requirements, submittable_actions};
#[cfg(feature = "wasm")]
use crate::board::BoardGeometry;
#[cfg(feature = "wasm")]
use crate::cards::CardKind;
#[cfg(feature = "wasm")]
use crate::game::GameView;
#[cfg(feature = "wasm")]
use crate::player::PlayerColor;
#[cfg(feature = "wasm")]
use crate::rules::GameRules;
#[cfg(feature = "wasm")]
use crate::selection::Selection;
#[cfg(feature = "wasm")]
use uuid::Uuid;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed selection session for one player in one game
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmSession {
    player_id: Uuid,
    geometry: BoardGeometry,
    selection: Selection,
    state: Option<GameView>,
}

#[cfg(feature = "wasm")]
fn js_err(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmSession {
    /// Create a session. `rules_json` may be empty for the default rules.
    #[wasm_bindgen(constructor)]
    pub fn new(player_id: &str, rules_json: &str) -> Result<WasmSession, JsValue> {
        let player_id: Uuid = player_id
            .parse()
            .map_err(|e| js_err("Invalid player id", e))?;
        let rules: GameRules = if rules_json.trim().is_empty() {
            GameRules::default()
        } else {
            serde_json::from_str(rules_json).map_err(|e| js_err("Invalid rules", e))?
        };
        let geometry = BoardGeometry::new(rules).map_err(|e| js_err("Invalid rules", e))?;

        Ok(WasmSession {
            player_id,
            geometry,
            selection: Selection::new(),
            state: None,
        })
    }

    /// Replace the mirrored game state with a freshly fetched one
    #[wasm_bindgen(js_name = setState)]
    pub fn set_state(&mut self, state_json: &str) -> Result<(), JsValue> {
        let state: GameView =
            serde_json::from_str(state_json).map_err(|e| js_err("Invalid game state", e))?;
        self.state = Some(state);
        Ok(())
    }

    /// Grid area ("row / col") for a figure, or an error if it cannot be drawn
    #[wasm_bindgen(js_name = figureGridArea)]
    pub fn figure_grid_area(
        &self,
        color: &str,
        position: i32,
        figure_index: usize,
    ) -> Result<String, JsValue> {
        let color: PlayerColor = serde_json::from_value(serde_json::Value::from(color))
            .map_err(|e| js_err("Invalid color", e))?;
        self.geometry
            .to_cell(color, position, figure_index)
            .map(|cell| cell.grid_area())
            .map_err(|e| js_err("Unrenderable", e))
    }

    /// Static board tiles as JSON (for drawing the empty board)
    #[wasm_bindgen(js_name = getTiles)]
    pub fn get_tiles(&self) -> String {
        serde_json::to_string(&self.geometry.tiles()).unwrap_or_else(|_| "[]".to_string())
    }

    #[wasm_bindgen(js_name = selectCard)]
    pub fn select_card(&mut self, index: usize) -> Result<(), JsValue> {
        let state = self.state.as_ref().ok_or_else(|| JsValue::from_str("No state"))?;
        let view = state
            .perspective(self.player_id)
            .ok_or_else(|| JsValue::from_str("Player not in game"))?;
        self.selection.select_card(index, view.hand());
        Ok(())
    }

    #[wasm_bindgen(js_name = selectFigure)]
    pub fn select_figure(&mut self, figure_id: &str) -> Result<(), JsValue> {
        let figure_id: Uuid = figure_id
            .parse()
            .map_err(|e| js_err("Invalid figure id", e))?;
        let state = self.state.as_ref().ok_or_else(|| JsValue::from_str("No state"))?;
        let view = state
            .perspective(self.player_id)
            .ok_or_else(|| JsValue::from_str("Player not in game"))?;
        self.selection.select_figure(figure_id, &view);
        Ok(())
    }

    #[wasm_bindgen(js_name = allocateInferno)]
    pub fn allocate_inferno(&mut self, figure_id: &str, steps: i32) -> Result<(), JsValue> {
        let figure_id: Uuid = figure_id
            .parse()
            .map_err(|e| js_err("Invalid figure id", e))?;
        let rules = *self.geometry.rules();
        self.selection
            .update_inferno_allocation(figure_id, i64::from(steps), &rules)
            .map_err(|e| js_err("Allocation rejected", e))
    }

    /// Imitation by the server's name: "Swap Card", "Start", "8", ...
    #[wasm_bindgen(js_name = setJokerImitation)]
    pub fn set_joker_imitation(&mut self, name: &str) -> Result<(), JsValue> {
        let kind = CardKind::parse_imitation(name)
            .ok_or_else(|| JsValue::from_str("Unknown card to imitate"))?;
        let state = self.state.as_ref().ok_or_else(|| JsValue::from_str("No state"))?;
        let view = state
            .perspective(self.player_id)
            .ok_or_else(|| JsValue::from_str("Player not in game"))?;
        self.selection
            .set_joker_imitation(kind, view.hand())
            .map_err(|e| js_err("Imitation rejected", e))
    }

    #[wasm_bindgen(js_name = cancelJokerImitation)]
    pub fn cancel_joker_imitation(&mut self) {
        self.selection.cancel_joker_imitation();
    }

    /// Call after the server accepted a play
    #[wasm_bindgen(js_name = resetSelection)]
    pub fn reset_selection(&mut self) {
        self.selection.reset_all();
    }

    #[wasm_bindgen(js_name = getSelection)]
    pub fn get_selection(&self) -> String {
        serde_json::to_string(&self.selection).unwrap_or_else(|_| "{}".to_string())
    }

    #[wasm_bindgen(js_name = getRequirements)]
    pub fn get_requirements(&self) -> String {
        let missing = self
            .state
            .as_ref()
            .and_then(|s| s.perspective(self.player_id))
            .map(|view| requirements(&view, &self.selection, self.geometry.rules()))
            .unwrap_or_default();
        serde_json::to_string(&missing).unwrap_or_else(|_| "[]".to_string())
    }

    /// Submittable actions as JSON; each entry has `card_index` and `details`
    #[wasm_bindgen(js_name = getSubmittableActions)]
    pub fn get_submittable_actions(&self) -> String {
        let actions = self
            .state
            .as_ref()
            .and_then(|s| s.perspective(self.player_id))
            .map(|view| submittable_actions(&view, &self.selection, self.geometry.rules()))
            .unwrap_or_default();
        serde_json::to_string(&actions).unwrap_or_else(|_| "[]".to_string())
    }
}
