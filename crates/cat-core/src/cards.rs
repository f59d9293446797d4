//! Hand cards and the card-type catalog.
//!
//! Cards arrive from the server as `{name, description, type, ...}` objects.
//! The `type` tag selects the variant; Standard and Start cards carry their
//! move values.

use serde::{Deserialize, Serialize};

/// Move value of a Flex card, in either direction
pub const FLEX_VALUE: u8 = 4;

/// Card behavior, tagged the way the server serializes it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CardKind {
    /// Move one figure forward by a fixed value
    #[serde(rename = "StandardCard")]
    Standard { value: u8 },
    /// Move one figure 4 fields forward or backward
    #[serde(rename = "FlexCard")]
    Flex,
    /// Start a figure from home, or move it by one of the values
    #[serde(rename = "StartCard")]
    Start { move_values: Vec<u8> },
    /// Swap one of your figures with any other figure
    #[serde(rename = "SwapCard")]
    Swap,
    /// Split the budget across your own figures
    #[serde(rename = "InfernoCard")]
    Inferno,
    /// Imitates any other card
    #[serde(rename = "JokerCard")]
    Joker,
}

impl CardKind {
    pub fn is_joker(&self) -> bool {
        matches!(self, CardKind::Joker)
    }

    /// Whether playing this card needs a single selected figure
    pub fn uses_single_figure(&self) -> bool {
        !matches!(self, CardKind::Inferno | CardKind::Joker)
    }

    /// The literal name a Joker sends to say it imitates this card.
    ///
    /// Returns `None` for the Joker itself.
    pub fn imitate_card_name(&self) -> Option<String> {
        match self {
            CardKind::Standard { value } => Some(value.to_string()),
            CardKind::Flex => Some("Flex Card".to_string()),
            CardKind::Start { .. } => Some("Start".to_string()),
            CardKind::Swap => Some("Swap Card".to_string()),
            CardKind::Inferno => Some("Inferno Card".to_string()),
            CardKind::Joker => None,
        }
    }

    /// Short face label, as printed on the card
    pub fn label(&self) -> String {
        match self {
            CardKind::Standard { value } => value.to_string(),
            CardKind::Flex => format!("{}+/-", FLEX_VALUE),
            CardKind::Start { move_values } => {
                let values: Vec<String> = move_values.iter().map(|v| v.to_string()).collect();
                format!("{}/Start", values.join("/"))
            }
            CardKind::Swap => "S".to_string(),
            CardKind::Inferno => "7".to_string(),
            CardKind::Joker => "J".to_string(),
        }
    }

    /// Parse an imitation choice typed by a user or sent by a UI.
    ///
    /// Accepts the server's imitation names plus `"13/Start"`-style labels.
    pub fn parse_imitation(input: &str) -> Option<CardKind> {
        let input = input.trim();
        match input {
            "Flex Card" | "Flex" | "flex" => return Some(CardKind::Flex),
            "Swap Card" | "Swap" | "swap" => return Some(CardKind::Swap),
            "Inferno Card" | "Inferno" | "inferno" => return Some(CardKind::Inferno),
            _ => {}
        }

        if let Some(values) = input.strip_suffix("/Start") {
            let move_values: Option<Vec<u8>> =
                values.split('/').map(|v| v.trim().parse().ok()).collect();
            return move_values
                .filter(|v| !v.is_empty())
                .map(|move_values| CardKind::Start { move_values });
        }

        input
            .parse::<u8>()
            .ok()
            .map(|value| CardKind::Standard { value })
    }
}

/// A card as dealt by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: CardKind,
}

impl Card {
    pub fn new(name: impl Into<String>, kind: CardKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
        }
    }

    pub fn standard(value: u8) -> Self {
        Self::new(value.to_string(), CardKind::Standard { value })
    }

    pub fn flex() -> Self {
        Self::new("Flex Card", CardKind::Flex)
    }

    pub fn start(move_values: Vec<u8>) -> Self {
        let name = CardKind::Start {
            move_values: move_values.clone(),
        }
        .label();
        Self::new(name, CardKind::Start { move_values })
    }

    pub fn swap() -> Self {
        Self::new("Swap Card", CardKind::Swap)
    }

    pub fn inferno() -> Self {
        Self::new("Inferno Card", CardKind::Inferno)
    }

    pub fn joker() -> Self {
        Self::new("Joker Card", CardKind::Joker)
    }
}

/// Static list of card types the server deals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardCatalog {
    cards: Vec<Card>,
}

impl CardCatalog {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// One entry per card type in the standard 110-card deck
    pub fn standard() -> Self {
        let mut cards: Vec<Card> = [2, 3, 5, 6, 8, 9, 10, 12]
            .into_iter()
            .map(Card::standard)
            .collect();
        cards.push(Card::flex());
        cards.push(Card::inferno());
        cards.push(Card::swap());
        cards.push(Card::start(vec![13]));
        cards.push(Card::start(vec![1, 11]));
        cards.push(Card::joker());
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Distinct card kinds a Joker may imitate, in catalog order
    pub fn joker_options(&self) -> Vec<CardKind> {
        let mut options: Vec<CardKind> = Vec::new();
        for card in &self.cards {
            if !card.kind.is_joker() && !options.contains(&card.kind) {
                options.push(card.kind.clone());
            }
        }
        options
    }
}

impl Default for CardCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
