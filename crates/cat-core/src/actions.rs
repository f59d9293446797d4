//! Card semantics: turning a selection into action requests.
//!
//! This module defines the action payload the server expects and the
//! resolver that decides, for the current selection, which choices are still
//! missing and which actions can be submitted.
//!
//! A Joker is resolved exactly once, in [`effective_card`]. Every rule after
//! that only sees the card being played as.

use crate::cards::{Card, CardKind, FLEX_VALUE};
use crate::game::Perspective;
use crate::player::FigureId;
use crate::rules::GameRules;
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of a Flex move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// One figure's share of an Inferno card
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfernoMove {
    pub figure_uuid: FigureId,
    pub steps: u32,
}

/// The action part of a play request, tagged by `action`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum CardAction {
    /// Bring a figure from home onto its start field
    Start { figure_uuid: FigureId },
    /// Move a figure along the track
    Move {
        figure_uuid: FigureId,
        value: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        direction: Option<Direction>,
    },
    /// Swap an own figure with another figure
    Swap {
        figure_uuid: FigureId,
        own_figure_uuid: FigureId,
        other_figure_uuid: FigureId,
    },
    /// Split the Inferno budget across own figures
    Inferno { moves: Vec<InfernoMove> },
}

/// What a Joker plays as
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Imitation {
    pub imitate_card_name: String,
    /// Only sent when imitating a Start card
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_values: Option<Vec<u8>>,
}

/// `action_details` of a play request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionDetails {
    #[serde(flatten)]
    pub action: CardAction,
    #[serde(flatten)]
    pub imitation: Option<Imitation>,
}

/// A fully resolved, submittable action for one hand card
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlannedAction {
    pub card_index: usize,
    pub details: ActionDetails,
}

impl PlannedAction {
    /// Short human-readable description
    pub fn describe(&self) -> String {
        let base = match &self.details.action {
            CardAction::Start { .. } => "start figure".to_string(),
            CardAction::Move {
                value,
                direction: Some(Direction::Backward),
                ..
            } => format!("move back {}", value),
            CardAction::Move { value, .. } => format!("move {}", value),
            CardAction::Swap { .. } => "swap figures".to_string(),
            CardAction::Inferno { moves } => format!("inferno across {} figure(s)", moves.len()),
        };
        match &self.details.imitation {
            Some(imitation) => format!("{} (joker as {})", base, imitation.imitate_card_name),
            None => base,
        }
    }
}

/// A choice the player still has to make
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    Card,
    JokerImitation,
    Figure,
    /// The selected figure must be on the track
    FigureOnPath,
    TargetFigure,
    /// Inferno points that still have to be allocated
    InfernoBudget { remaining: i64 },
}

/// Why no action can be built from the current selection
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ResolveError {
    #[error("No card selected")]
    NoCardSelected,

    #[error("Selected card {0} is no longer in hand")]
    CardNotInHand(usize),

    #[error("Choose which card the Joker imitates")]
    ImitationRequired,

    #[error("Select a figure")]
    FigureRequired,

    #[error("Figure {0} is not on the board")]
    FigureNotFound(FigureId),

    #[error("Figure {0} is not on the track")]
    FigureNotOnPath(FigureId),

    #[error("Select a figure to swap with")]
    TargetRequired,

    #[error("Cannot swap a figure with itself")]
    SameFigure,

    #[error("{remaining} Inferno steps left to allocate")]
    BudgetNotSpent { remaining: i64 },

    #[error("Inferno can only move your own figures")]
    ForeignInfernoFigure(FigureId),
}

/// The card being played, after Joker substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveCard<'a> {
    pub index: usize,
    pub card: &'a Card,
    pub kind: &'a CardKind,
}

impl EffectiveCard<'_> {
    pub fn via_joker(&self) -> bool {
        self.card.kind.is_joker()
    }

    fn imitation(&self) -> Option<Imitation> {
        if !self.via_joker() {
            return None;
        }
        let move_values = match self.kind {
            CardKind::Start { move_values } => Some(move_values.clone()),
            _ => None,
        };
        self.kind
            .imitate_card_name()
            .map(|imitate_card_name| Imitation {
                imitate_card_name,
                move_values,
            })
    }
}

/// Resolve the selected card, substituting a Joker's imitation.
pub fn effective_card<'a>(
    hand: &'a [Card],
    selection: &'a Selection,
) -> Result<EffectiveCard<'a>, ResolveError> {
    let index = selection.selected_card().ok_or(ResolveError::NoCardSelected)?;
    let card = hand.get(index).ok_or(ResolveError::CardNotInHand(index))?;
    let kind = match (&card.kind, selection.joker_imitation()) {
        (CardKind::Joker, Some(imitation)) => imitation,
        (CardKind::Joker, None) => return Err(ResolveError::ImitationRequired),
        (kind, _) => kind,
    };
    Ok(EffectiveCard { index, card, kind })
}

/// Every action the current selection allows, or the first unmet precondition.
pub fn resolve(
    view: &Perspective<'_>,
    selection: &Selection,
    rules: &GameRules,
) -> Result<Vec<PlannedAction>, ResolveError> {
    let effective = effective_card(view.hand(), selection)?;

    let actions: Vec<CardAction> = match effective.kind {
        CardKind::Standard { value } => {
            let figure = figure_on_path(view, selection, rules)?;
            vec![CardAction::Move {
                figure_uuid: figure,
                value: *value,
                direction: None,
            }]
        }
        CardKind::Flex => {
            let figure = figure_on_path(view, selection, rules)?;
            [Direction::Forward, Direction::Backward]
                .into_iter()
                .map(|direction| CardAction::Move {
                    figure_uuid: figure,
                    value: FLEX_VALUE,
                    direction: Some(direction),
                })
                .collect()
        }
        CardKind::Start { move_values } => {
            let figure_id = selection
                .selected_figure()
                .ok_or(ResolveError::FigureRequired)?;
            let figure = view
                .figure(figure_id)
                .ok_or(ResolveError::FigureNotFound(figure_id))?;
            if figure.is_home() {
                vec![CardAction::Start {
                    figure_uuid: figure_id,
                }]
            } else if figure.is_on_path(rules) {
                move_values
                    .iter()
                    .map(|value| CardAction::Move {
                        figure_uuid: figure_id,
                        value: *value,
                        direction: None,
                    })
                    .collect()
            } else {
                return Err(ResolveError::FigureNotOnPath(figure_id));
            }
        }
        CardKind::Swap => {
            let primary = figure_on_path(view, selection, rules)?;
            let target = selection
                .target_figure()
                .ok_or(ResolveError::TargetRequired)?;
            if target == primary {
                return Err(ResolveError::SameFigure);
            }
            let target_figure = view
                .figure(target)
                .ok_or(ResolveError::FigureNotFound(target))?;
            if !target_figure.is_on_path(rules) {
                return Err(ResolveError::FigureNotOnPath(target));
            }
            vec![CardAction::Swap {
                figure_uuid: primary,
                own_figure_uuid: primary,
                other_figure_uuid: target,
            }]
        }
        CardKind::Inferno => {
            let remaining = selection.remaining_inferno_budget(rules);
            if remaining != 0 {
                return Err(ResolveError::BudgetNotSpent { remaining });
            }
            if let Some(foreign) = selection
                .inferno_plan()
                .keys()
                .find(|id| !view.is_own(**id))
            {
                return Err(ResolveError::ForeignInfernoFigure(*foreign));
            }
            let moves = selection
                .inferno_plan()
                .iter()
                .map(|(figure, steps)| InfernoMove {
                    figure_uuid: *figure,
                    steps: *steps,
                })
                .collect();
            vec![CardAction::Inferno { moves }]
        }
        // effective_card never yields an unresolved Joker
        CardKind::Joker => return Err(ResolveError::ImitationRequired),
    };

    let imitation = effective.imitation();
    Ok(actions
        .into_iter()
        .map(|action| PlannedAction {
            card_index: effective.index,
            details: ActionDetails {
                action,
                imitation: imitation.clone(),
            },
        })
        .collect())
}

/// Actions the UI may offer right now; empty while choices are missing.
pub fn submittable_actions(
    view: &Perspective<'_>,
    selection: &Selection,
    rules: &GameRules,
) -> Vec<PlannedAction> {
    resolve(view, selection, rules).unwrap_or_default()
}

/// Choices still missing before anything can be submitted.
pub fn requirements(
    view: &Perspective<'_>,
    selection: &Selection,
    rules: &GameRules,
) -> Vec<Requirement> {
    let effective = match effective_card(view.hand(), selection) {
        Ok(effective) => effective,
        Err(ResolveError::ImitationRequired) => return vec![Requirement::JokerImitation],
        Err(_) => return vec![Requirement::Card],
    };

    let mut missing = Vec::new();
    match effective.kind {
        CardKind::Standard { .. } | CardKind::Flex => {
            if let Some(requirement) = single_figure_requirement(view, selection, rules, true) {
                missing.push(requirement);
            }
        }
        CardKind::Start { .. } => {
            if let Some(requirement) = single_figure_requirement(view, selection, rules, false) {
                missing.push(requirement);
            }
        }
        CardKind::Swap => {
            if let Some(requirement) = single_figure_requirement(view, selection, rules, true) {
                missing.push(requirement);
            }
            let target_ok = selection
                .target_figure()
                .filter(|t| Some(*t) != selection.selected_figure())
                .and_then(|t| view.figure(t))
                .map_or(false, |f| f.is_on_path(rules));
            if !target_ok {
                missing.push(Requirement::TargetFigure);
            }
        }
        CardKind::Inferno => {
            let remaining = selection.remaining_inferno_budget(rules);
            if remaining != 0 {
                missing.push(Requirement::InfernoBudget { remaining });
            }
        }
        CardKind::Joker => missing.push(Requirement::JokerImitation),
    }
    missing
}

fn single_figure_requirement(
    view: &Perspective<'_>,
    selection: &Selection,
    rules: &GameRules,
    needs_path: bool,
) -> Option<Requirement> {
    let figure = match selection.selected_figure().and_then(|id| view.figure(id)) {
        Some(figure) => figure,
        None => return Some(Requirement::Figure),
    };
    let usable = if needs_path {
        figure.is_on_path(rules)
    } else {
        figure.is_home() || figure.is_on_path(rules)
    };
    (!usable).then_some(Requirement::FigureOnPath)
}

fn figure_on_path(
    view: &Perspective<'_>,
    selection: &Selection,
    rules: &GameRules,
) -> Result<FigureId, ResolveError> {
    let id = selection
        .selected_figure()
        .ok_or(ResolveError::FigureRequired)?;
    let figure = view.figure(id).ok_or(ResolveError::FigureNotFound(id))?;
    if !figure.is_on_path(rules) {
        return Err(ResolveError::FigureNotOnPath(id));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use uuid::Uuid;

    fn figure() -> FigureId {
        "c8f4fd43-3a77-4e1c-a9a4-0f3d9f9e8a01".parse().unwrap()
    }

    #[test]
    fn test_move_payload_shape() {
        let action = PlannedAction {
            card_index: 0,
            details: ActionDetails {
                action: CardAction::Move {
                    figure_uuid: figure(),
                    value: 3,
                    direction: None,
                },
                imitation: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&action.details).unwrap(),
            json!({
                "action": "move",
                "figure_uuid": "c8f4fd43-3a77-4e1c-a9a4-0f3d9f9e8a01",
                "value": 3
            })
        );
    }

    #[test]
    fn test_flex_payload_has_direction() {
        let details = ActionDetails {
            action: CardAction::Move {
                figure_uuid: figure(),
                value: 4,
                direction: Some(Direction::Backward),
            },
            imitation: None,
        };
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["direction"], "backward");
        assert_eq!(value["value"], 4);
    }

    #[test]
    fn test_joker_start_payload() {
        let details = ActionDetails {
            action: CardAction::Start {
                figure_uuid: figure(),
            },
            imitation: Some(Imitation {
                imitate_card_name: "Start".to_string(),
                move_values: Some(vec![1, 11]),
            }),
        };
        assert_eq!(
            serde_json::to_value(&details).unwrap(),
            json!({
                "action": "start",
                "figure_uuid": "c8f4fd43-3a77-4e1c-a9a4-0f3d9f9e8a01",
                "imitate_card_name": "Start",
                "move_values": [1, 11]
            })
        );
    }

    #[test]
    fn test_swap_and_inferno_payloads() {
        let other = Uuid::nil();
        let swap = ActionDetails {
            action: CardAction::Swap {
                figure_uuid: figure(),
                own_figure_uuid: figure(),
                other_figure_uuid: other,
            },
            imitation: None,
        };
        let value = serde_json::to_value(&swap).unwrap();
        assert_eq!(value["action"], "swap");
        assert_eq!(value["own_figure_uuid"], value["figure_uuid"]);
        assert_eq!(value["other_figure_uuid"], other.to_string());

        let inferno = ActionDetails {
            action: CardAction::Inferno {
                moves: vec![InfernoMove {
                    figure_uuid: figure(),
                    steps: 7,
                }],
            },
            imitation: None,
        };
        assert_eq!(
            serde_json::to_value(&inferno).unwrap(),
            json!({
                "action": "inferno",
                "moves": [{"figure_uuid": "c8f4fd43-3a77-4e1c-a9a4-0f3d9f9e8a01", "steps": 7}]
            })
        );
    }

    #[test]
    fn test_effective_card_substitutes_joker() {
        let hand = vec![Card::joker()];
        let mut selection = Selection::new();
        assert_eq!(
            effective_card(&hand, &selection).unwrap_err(),
            ResolveError::NoCardSelected
        );

        selection.select_card(0, &hand);
        assert_eq!(
            effective_card(&hand, &selection).unwrap_err(),
            ResolveError::ImitationRequired
        );

        selection.set_joker_imitation(CardKind::Flex, &hand).unwrap();
        let effective = effective_card(&hand, &selection).unwrap();
        assert_eq!(effective.kind, &CardKind::Flex);
        assert!(effective.via_joker());
    }

    #[test]
    fn test_selected_card_gone_from_hand() {
        let hand = vec![Card::standard(2), Card::standard(3)];
        let mut selection = Selection::new();
        selection.select_card(1, &hand);
        assert_eq!(
            effective_card(&hand[..1], &selection).unwrap_err(),
            ResolveError::CardNotInHand(1)
        );
    }

    #[test]
    fn test_describe() {
        let action = PlannedAction {
            card_index: 2,
            details: ActionDetails {
                action: CardAction::Move {
                    figure_uuid: figure(),
                    value: 11,
                    direction: None,
                },
                imitation: Some(Imitation {
                    imitate_card_name: "Start".to_string(),
                    move_values: Some(vec![1, 11]),
                }),
            },
        };
        assert_eq!(action.describe(), "move 11 (joker as Start)");
    }
}
