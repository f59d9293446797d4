//! Authoritative game state, as mirrored by the client.
//!
//! The server sends the full state personalized for one player: that player's
//! hand is visible, every other hand is a count. The client never patches a
//! `GameView`; each fetch replaces it.

use crate::cards::Card;
use crate::player::{FigureId, FigureView, PlayerView, TurnSlot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The complete game state from one player's point of view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub host_id: Option<Uuid>,
    #[serde(default)]
    pub game_started: bool,
    #[serde(default)]
    pub game_over: bool,
    /// Players in turn order
    pub players: Vec<PlayerView>,
    /// Index into `players` of whoever is on turn
    #[serde(default)]
    pub current_player_index: usize,
    #[serde(default)]
    pub round_number: u32,
    /// Top of the discard pile
    #[serde(default)]
    pub last_played_card: Option<Card>,
    /// Seconds left for the active player, when the server runs a turn clock
    #[serde(default)]
    pub turn_time_remaining: Option<f64>,
    /// Full turn length in seconds
    #[serde(default)]
    pub turn_duration: Option<f64>,
}

impl GameView {
    pub fn get_player(&self, slot: TurnSlot) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.number == slot)
    }

    /// Player whose turn it is
    pub fn current_player(&self) -> Option<&PlayerView> {
        self.players.get(self.current_player_index)
    }

    pub fn local_player(&self, player_id: Uuid) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.uuid == Some(player_id))
    }

    /// Figure by id, together with its owner and its index in the owner's list
    pub fn find_figure(&self, id: FigureId) -> Option<(&PlayerView, usize, &FigureView)> {
        self.players
            .iter()
            .find_map(|p| p.figure(id).map(|(idx, f)| (p, idx, f)))
    }

    pub fn is_players_turn(&self, player_id: Uuid) -> bool {
        self.current_player()
            .map_or(false, |p| p.uuid == Some(player_id))
    }

    /// Bind this state to the local player
    pub fn perspective(&self, player_id: Uuid) -> Option<Perspective<'_>> {
        let local = self.local_player(player_id)?;
        Some(Perspective { game: self, local })
    }
}

/// The game seen by the local player: their hand plus every figure
#[derive(Debug, Clone, Copy)]
pub struct Perspective<'a> {
    pub game: &'a GameView,
    pub local: &'a PlayerView,
}

impl<'a> Perspective<'a> {
    pub fn hand(&self) -> &'a [Card] {
        self.local.cards.cards()
    }

    pub fn figure(&self, id: FigureId) -> Option<&'a FigureView> {
        self.game.find_figure(id).map(|(_, _, f)| f)
    }

    pub fn is_own(&self, id: FigureId) -> bool {
        self.local.owns(id)
    }

    pub fn is_my_turn(&self) -> bool {
        self.game
            .current_player()
            .map_or(false, |p| p.number == self.local.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardKind;
    use crate::player::PlayerColor;

    const STATE: &str = r#"{
        "uuid": "7f1c1c8e-58f6-4a0e-9a39-0b8f5d0a4c11",
        "name": "Friday cats",
        "host_id": "0d3e8f5c-9b61-4b55-8f4c-2a4b6f7c2d10",
        "number_of_players": 2,
        "field_occupation": {},
        "game_over": false,
        "current_player_index": 1,
        "round_number": 2,
        "game_started": true,
        "turn_time_remaining": 12.5,
        "turn_duration": 20,
        "players": [
            {
                "uuid": "0d3e8f5c-9b61-4b55-8f4c-2a4b6f7c2d10",
                "name": "Alex",
                "number": 0,
                "color": "green",
                "cards": [{"name": "Swap Card", "description": "", "type": "SwapCard"}],
                "figures": [
                    {"uuid": "c8f4fd43-3a77-4e1c-a9a4-0f3d9f9e8a01", "color": "green", "position": 12}
                ],
                "startfield": 0,
                "finishing_field": 53
            },
            {
                "name": "Ben",
                "number": 1,
                "color": "pink",
                "cards": 4,
                "figures": [
                    {"uuid": "5b0b8a3e-6e53-4d6e-8f0f-1b5e0c1d2e02", "color": "pink", "position": -1}
                ]
            }
        ]
    }"#;

    fn alex() -> Uuid {
        "0d3e8f5c-9b61-4b55-8f4c-2a4b6f7c2d10".parse().unwrap()
    }

    #[test]
    fn test_parse_personalized_state() {
        let game: GameView = serde_json::from_str(STATE).unwrap();
        assert_eq!(game.players.len(), 2);
        assert_eq!(game.players[1].cards.len(), 4);
        assert_eq!(game.turn_duration, Some(20.0));
        assert!(game.last_played_card.is_none());

        let local = game.local_player(alex()).unwrap();
        assert_eq!(local.color, PlayerColor::Green);
        assert_eq!(local.cards.cards()[0].kind, CardKind::Swap);
    }

    #[test]
    fn test_turn_checks() {
        let game: GameView = serde_json::from_str(STATE).unwrap();
        assert!(!game.is_players_turn(alex()));
        assert_eq!(game.current_player().unwrap().name, "Ben");

        let perspective = game.perspective(alex()).unwrap();
        assert!(!perspective.is_my_turn());
    }

    #[test]
    fn test_find_figure_reports_owner() {
        let game: GameView = serde_json::from_str(STATE).unwrap();
        let pink_figure: Uuid = "5b0b8a3e-6e53-4d6e-8f0f-1b5e0c1d2e02".parse().unwrap();
        let (owner, idx, figure) = game.find_figure(pink_figure).unwrap();
        assert_eq!(owner.name, "Ben");
        assert_eq!(idx, 0);
        assert!(figure.is_home());

        let perspective = game.perspective(alex()).unwrap();
        assert!(!perspective.is_own(pink_figure));
    }

    #[test]
    fn test_unknown_local_player_has_no_perspective() {
        let game: GameView = serde_json::from_str(STATE).unwrap();
        assert!(game.perspective(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_malformed_state_is_rejected() {
        let broken = STATE.replace("\"green\"", "\"purple\"");
        assert!(serde_json::from_str::<GameView>(&broken).is_err());
    }
}
