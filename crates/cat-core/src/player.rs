//! Player and figure views as mirrored from the server.
//!
//! This module contains:
//! - PlayerColor and its binding to turn slots
//! - FigureView with position classification
//! - PlayerView, whose hand is either full cards (local player) or a count

use crate::board::BoardPosition;
use crate::cards::Card;
use crate::rules::GameRules;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable figure identifier
pub type FigureId = Uuid;

/// Player turn slot (0-3)
pub type TurnSlot = u8;

/// Player color, bound to a turn slot by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Green,
    Pink,
    Orange,
    Blue,
}

impl PlayerColor {
    /// All colors in turn-slot order
    pub const ALL: [PlayerColor; 4] = [
        PlayerColor::Green,
        PlayerColor::Pink,
        PlayerColor::Orange,
        PlayerColor::Blue,
    ];

    /// Get color for a turn slot
    pub fn for_slot(slot: TurnSlot) -> Self {
        Self::ALL[usize::from(slot % 4)]
    }

    /// Turn slot this color plays in
    pub fn slot(&self) -> TurnSlot {
        match self {
            PlayerColor::Green => 0,
            PlayerColor::Pink => 1,
            PlayerColor::Orange => 2,
            PlayerColor::Blue => 3,
        }
    }

    /// Lower-case name, as used by the server and the stylesheet classes
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerColor::Green => "green",
            PlayerColor::Pink => "pink",
            PlayerColor::Orange => "orange",
            PlayerColor::Blue => "blue",
        }
    }
}

/// A figure as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureView {
    pub uuid: FigureId,
    pub color: PlayerColor,
    /// Raw wire position (negative = home, `>= 100` = finish lane)
    pub position: i32,
}

impl FigureView {
    pub fn board_position(&self, rules: &GameRules) -> Option<BoardPosition> {
        BoardPosition::from_raw(self.position, rules)
    }

    pub fn is_home(&self) -> bool {
        self.position < 0
    }

    /// On the board means anywhere but home
    pub fn is_on_board(&self) -> bool {
        !self.is_home()
    }

    pub fn is_on_path(&self, rules: &GameRules) -> bool {
        matches!(self.board_position(rules), Some(BoardPosition::Path(_)))
    }
}

/// A player's hand: full cards for the local player, a count for everyone else
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandView {
    Cards(Vec<Card>),
    Count(usize),
}

impl HandView {
    pub fn len(&self) -> usize {
        match self {
            HandView::Cards(cards) => cards.len(),
            HandView::Count(count) => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible cards (empty for opponents)
    pub fn cards(&self) -> &[Card] {
        match self {
            HandView::Cards(cards) => cards,
            HandView::Count(_) => &[],
        }
    }
}

impl Default for HandView {
    fn default() -> Self {
        HandView::Count(0)
    }
}

/// A player as seen from the local player's perspective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Only guaranteed for the local player
    #[serde(default)]
    pub uuid: Option<Uuid>,
    pub name: String,
    /// Turn slot
    pub number: TurnSlot,
    pub color: PlayerColor,
    #[serde(default)]
    pub cards: HandView,
    #[serde(default)]
    pub figures: Vec<FigureView>,
    #[serde(default)]
    pub startfield: Option<u16>,
    #[serde(default)]
    pub finishing_field: Option<u16>,
}

impl PlayerView {
    /// Find one of this player's figures and its index in the figure list
    pub fn figure(&self, id: FigureId) -> Option<(usize, &FigureView)> {
        self.figures.iter().enumerate().find(|(_, f)| f.uuid == id)
    }

    pub fn owns(&self, id: FigureId) -> bool {
        self.figure(id).is_some()
    }
}
