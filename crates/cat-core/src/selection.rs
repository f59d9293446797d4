//! The local player's tentative choices before an action is submitted.
//!
//! Selection is pure data plus transition rules. It never talks to the
//! server; the resolver turns a complete selection into an action request.

use crate::cards::{Card, CardKind};
use crate::game::Perspective;
use crate::player::FigureId;
use crate::rules::GameRules;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SelectionError {
    #[error("Cannot allocate a negative number of steps")]
    NegativeAllocation,

    #[error("Requested {requested} steps but only {available} remain")]
    OverBudget { requested: u32, available: u32 },

    #[error("No card selected")]
    NoCardSelected,

    #[error("The selected card is not a Joker")]
    NotAJoker,

    #[error("A Joker cannot imitate another Joker")]
    InvalidImitation,
}

/// Tentative choices of the local player
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    selected_card: Option<usize>,
    selected_figure: Option<FigureId>,
    target_figure: Option<FigureId>,
    /// Never contains zero entries
    inferno_plan: BTreeMap<FigureId, u32>,
    joker_imitation: Option<CardKind>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_card(&self) -> Option<usize> {
        self.selected_card
    }

    pub fn selected_figure(&self) -> Option<FigureId> {
        self.selected_figure
    }

    pub fn target_figure(&self) -> Option<FigureId> {
        self.target_figure
    }

    pub fn inferno_plan(&self) -> &BTreeMap<FigureId, u32> {
        &self.inferno_plan
    }

    pub fn joker_imitation(&self) -> Option<&CardKind> {
        self.joker_imitation.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The card whose rules currently govern selection.
    ///
    /// A Joker is replaced by its imitation once one is chosen; an unresolved
    /// Joker stays `CardKind::Joker`.
    pub fn effective_kind<'a>(&'a self, hand: &'a [Card]) -> Option<&'a CardKind> {
        let card = hand.get(self.selected_card?)?;
        match (&card.kind, &self.joker_imitation) {
            (CardKind::Joker, Some(imitation)) => Some(imitation),
            (kind, _) => Some(kind),
        }
    }

    fn effective_is_swap(&self, hand: &[Card]) -> bool {
        matches!(self.effective_kind(hand), Some(CardKind::Swap))
    }

    /// Select a hand card, or deselect it when it is already selected.
    ///
    /// Indices past the end of the hand are ignored.
    pub fn select_card(&mut self, index: usize, hand: &[Card]) {
        if self.selected_card == Some(index) {
            self.selected_card = None;
        } else {
            let Some(card) = hand.get(index) else {
                return;
            };
            self.selected_card = Some(index);
            if !card.kind.uses_single_figure() {
                self.selected_figure = None;
                self.target_figure = None;
            }
        }
        // The imitation belongs to the previously selected Joker
        self.joker_imitation = None;
        self.normalize(hand);
    }

    /// React to a click on a figure.
    pub fn select_figure(&mut self, id: FigureId, view: &Perspective<'_>) {
        let hand = view.hand();

        if !self.effective_is_swap(hand) {
            self.selected_figure = if self.selected_figure == Some(id) {
                None
            } else {
                Some(id)
            };
            self.target_figure = None;
            return;
        }

        let on_board = view.figure(id).map_or(false, |f| f.is_on_board());

        match self.selected_figure {
            Some(primary) if primary == id => {
                self.selected_figure = None;
                self.target_figure = None;
            }
            None => {
                if on_board && view.is_own(id) {
                    self.selected_figure = Some(id);
                }
            }
            Some(_) => {
                if on_board {
                    self.target_figure = if self.target_figure == Some(id) {
                        None
                    } else {
                        Some(id)
                    };
                }
            }
        }
    }

    /// Set how many Inferno steps a figure gets. Zero removes the figure.
    pub fn update_inferno_allocation(
        &mut self,
        figure: FigureId,
        steps: i64,
        rules: &GameRules,
    ) -> Result<(), SelectionError> {
        if steps < 0 {
            return Err(SelectionError::NegativeAllocation);
        }
        if steps == 0 {
            self.inferno_plan.remove(&figure);
            return Ok(());
        }

        let others: u32 = self
            .inferno_plan
            .iter()
            .filter(|(id, _)| **id != figure)
            .map(|(_, s)| *s)
            .sum();
        let available = u32::from(rules.inferno_budget).saturating_sub(others);
        let requested = u32::try_from(steps).unwrap_or(u32::MAX);
        if requested > available {
            return Err(SelectionError::OverBudget {
                requested,
                available,
            });
        }

        self.inferno_plan.insert(figure, requested);
        Ok(())
    }

    /// Inferno points not yet allocated
    pub fn remaining_inferno_budget(&self, rules: &GameRules) -> i64 {
        let allocated: i64 = self.inferno_plan.values().map(|s| i64::from(*s)).sum();
        i64::from(rules.inferno_budget) - allocated
    }

    /// Choose which card the selected Joker plays as.
    pub fn set_joker_imitation(
        &mut self,
        imitation: CardKind,
        hand: &[Card],
    ) -> Result<(), SelectionError> {
        let card = self
            .selected_card
            .and_then(|idx| hand.get(idx))
            .ok_or(SelectionError::NoCardSelected)?;
        if !card.kind.is_joker() {
            return Err(SelectionError::NotAJoker);
        }
        if imitation.is_joker() {
            return Err(SelectionError::InvalidImitation);
        }

        self.joker_imitation = Some(imitation);
        self.normalize(hand);
        Ok(())
    }

    pub fn clear_joker_imitation(&mut self, hand: &[Card]) {
        self.joker_imitation = None;
        self.normalize(hand);
    }

    /// Abandon an in-progress Joker choice. Everything is reset.
    pub fn cancel_joker_imitation(&mut self) {
        self.reset_all();
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    /// Drop choices that only make sense for a card no longer in effect
    fn normalize(&mut self, hand: &[Card]) {
        let effective = self.effective_kind(hand).cloned();
        if !matches!(effective, Some(CardKind::Swap)) {
            self.target_figure = None;
        }
        if !matches!(effective, Some(CardKind::Inferno)) {
            self.inferno_plan.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameView;
    use crate::player::{FigureView, HandView, PlayerColor, PlayerView};
    use uuid::Uuid;

    struct Fixture {
        game: GameView,
        me: Uuid,
        own_path: FigureId,
        own_home: FigureId,
        other_path: FigureId,
    }

    fn fixture(hand: Vec<Card>) -> Fixture {
        let me = Uuid::new_v4();
        let own_path = Uuid::new_v4();
        let own_home = Uuid::new_v4();
        let other_path = Uuid::new_v4();
        let game = GameView {
            uuid: Uuid::new_v4(),
            name: "test".to_string(),
            host_id: Some(me),
            game_started: true,
            game_over: false,
            players: vec![
                PlayerView {
                    uuid: Some(me),
                    name: "Me".to_string(),
                    number: 0,
                    color: PlayerColor::Green,
                    cards: HandView::Cards(hand),
                    figures: vec![
                        FigureView {
                            uuid: own_path,
                            color: PlayerColor::Green,
                            position: 10,
                        },
                        FigureView {
                            uuid: own_home,
                            color: PlayerColor::Green,
                            position: -1,
                        },
                    ],
                    startfield: None,
                    finishing_field: None,
                },
                PlayerView {
                    uuid: None,
                    name: "Them".to_string(),
                    number: 1,
                    color: PlayerColor::Pink,
                    cards: HandView::Count(3),
                    figures: vec![FigureView {
                        uuid: other_path,
                        color: PlayerColor::Pink,
                        position: 30,
                    }],
                    startfield: None,
                    finishing_field: None,
                },
            ],
            current_player_index: 0,
            round_number: 1,
            last_played_card: None,
            turn_time_remaining: None,
            turn_duration: None,
        };
        Fixture {
            game,
            me,
            own_path,
            own_home,
            other_path,
        }
    }

    #[test]
    fn test_select_same_card_twice_deselects() {
        let hand = vec![Card::standard(3), Card::flex()];
        let mut selection = Selection::new();

        selection.select_card(1, &hand);
        assert_eq!(selection.selected_card(), Some(1));
        selection.select_card(1, &hand);
        assert_eq!(selection.selected_card(), None);
    }

    #[test]
    fn test_select_past_end_of_hand_ignored() {
        let fx = fixture(vec![Card::standard(3), Card::flex()]);
        let view = fx.game.perspective(fx.me).unwrap();
        let mut selection = Selection::new();

        selection.select_card(5, view.hand());
        assert_eq!(selection, Selection::new());

        selection.select_card(0, view.hand());
        selection.select_figure(fx.own_path, &view);
        selection.select_card(2, view.hand());
        assert_eq!(selection.selected_card(), Some(0));
        assert_eq!(selection.selected_figure(), Some(fx.own_path));
    }

    #[test]
    fn test_inferno_or_joker_clears_figure() {
        let fx = fixture(vec![Card::standard(3), Card::inferno(), Card::joker()]);
        let view = fx.game.perspective(fx.me).unwrap();
        let mut selection = Selection::new();

        selection.select_card(0, view.hand());
        selection.select_figure(fx.own_path, &view);
        assert_eq!(selection.selected_figure(), Some(fx.own_path));

        selection.select_card(1, view.hand());
        assert_eq!(selection.selected_figure(), None);

        selection.select_card(0, view.hand());
        selection.select_figure(fx.own_path, &view);
        selection.select_card(2, view.hand());
        assert_eq!(selection.selected_figure(), None);
    }

    #[test]
    fn test_standard_card_keeps_figure() {
        let fx = fixture(vec![Card::standard(3), Card::flex()]);
        let view = fx.game.perspective(fx.me).unwrap();
        let mut selection = Selection::new();

        selection.select_card(0, view.hand());
        selection.select_figure(fx.own_path, &view);
        selection.select_card(1, view.hand());
        assert_eq!(selection.selected_figure(), Some(fx.own_path));
    }

    #[test]
    fn test_plain_figure_toggle() {
        let fx = fixture(vec![Card::standard(5)]);
        let view = fx.game.perspective(fx.me).unwrap();
        let mut selection = Selection::new();
        selection.select_card(0, view.hand());

        selection.select_figure(fx.own_path, &view);
        assert_eq!(selection.selected_figure(), Some(fx.own_path));
        selection.select_figure(fx.other_path, &view);
        assert_eq!(selection.selected_figure(), Some(fx.other_path));
        selection.select_figure(fx.other_path, &view);
        assert_eq!(selection.selected_figure(), None);
        assert_eq!(selection.target_figure(), None);
    }

    #[test]
    fn test_swap_selection_sequence() {
        let fx = fixture(vec![Card::swap()]);
        let view = fx.game.perspective(fx.me).unwrap();
        let mut selection = Selection::new();
        selection.select_card(0, view.hand());

        selection.select_figure(fx.own_path, &view);
        assert_eq!(selection.selected_figure(), Some(fx.own_path));
        assert_eq!(selection.target_figure(), None);

        selection.select_figure(fx.other_path, &view);
        assert_eq!(selection.selected_figure(), Some(fx.own_path));
        assert_eq!(selection.target_figure(), Some(fx.other_path));

        selection.select_figure(fx.own_path, &view);
        assert_eq!(selection.selected_figure(), None);
        assert_eq!(selection.target_figure(), None);
    }

    #[test]
    fn test_swap_primary_must_be_own_and_on_board() {
        let fx = fixture(vec![Card::swap()]);
        let view = fx.game.perspective(fx.me).unwrap();
        let mut selection = Selection::new();
        selection.select_card(0, view.hand());

        selection.select_figure(fx.other_path, &view);
        assert_eq!(selection.selected_figure(), None);

        selection.select_figure(fx.own_home, &view);
        assert_eq!(selection.selected_figure(), None);
    }

    #[test]
    fn test_swap_target_toggles_and_ignores_home() {
        let fx = fixture(vec![Card::swap()]);
        let view = fx.game.perspective(fx.me).unwrap();
        let mut selection = Selection::new();
        selection.select_card(0, view.hand());
        selection.select_figure(fx.own_path, &view);

        selection.select_figure(fx.own_home, &view);
        assert_eq!(selection.target_figure(), None);

        selection.select_figure(fx.other_path, &view);
        selection.select_figure(fx.other_path, &view);
        assert_eq!(selection.target_figure(), None);
        assert_eq!(selection.selected_figure(), Some(fx.own_path));
    }

    #[test]
    fn test_target_cleared_when_leaving_swap() {
        let fx = fixture(vec![Card::swap(), Card::standard(2)]);
        let view = fx.game.perspective(fx.me).unwrap();
        let mut selection = Selection::new();
        selection.select_card(0, view.hand());
        selection.select_figure(fx.own_path, &view);
        selection.select_figure(fx.other_path, &view);

        selection.select_card(1, view.hand());
        assert_eq!(selection.target_figure(), None);
        assert_eq!(selection.selected_figure(), Some(fx.own_path));
    }

    #[test]
    fn test_inferno_allocation_budget() {
        let rules = GameRules::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut selection = Selection::new();

        selection.update_inferno_allocation(a, 4, &rules).unwrap();
        selection.update_inferno_allocation(b, 3, &rules).unwrap();
        assert_eq!(selection.remaining_inferno_budget(&rules), 0);

        // Replacing an allocation frees its old steps first
        selection.update_inferno_allocation(a, 2, &rules).unwrap();
        assert_eq!(selection.remaining_inferno_budget(&rules), 2);

        assert_eq!(
            selection.update_inferno_allocation(b, 6, &rules),
            Err(SelectionError::OverBudget {
                requested: 6,
                available: 5
            })
        );
        assert_eq!(selection.inferno_plan().get(&b), Some(&3));
    }

    #[test]
    fn test_inferno_zero_removes_and_negative_rejected() {
        let rules = GameRules::default();
        let a = Uuid::new_v4();
        let mut selection = Selection::new();

        selection.update_inferno_allocation(a, 3, &rules).unwrap();
        selection.update_inferno_allocation(a, 0, &rules).unwrap();
        assert!(selection.inferno_plan().is_empty());

        assert_eq!(
            selection.update_inferno_allocation(a, -2, &rules),
            Err(SelectionError::NegativeAllocation)
        );
        assert!(selection.inferno_plan().is_empty());
        assert_eq!(selection.remaining_inferno_budget(&rules), 7);
    }

    #[test]
    fn test_joker_imitation_rules() {
        let hand = vec![Card::joker(), Card::swap()];
        let mut selection = Selection::new();

        assert_eq!(
            selection.set_joker_imitation(CardKind::Swap, &hand),
            Err(SelectionError::NoCardSelected)
        );

        selection.select_card(1, &hand);
        assert_eq!(
            selection.set_joker_imitation(CardKind::Flex, &hand),
            Err(SelectionError::NotAJoker)
        );

        selection.select_card(0, &hand);
        assert_eq!(
            selection.set_joker_imitation(CardKind::Joker, &hand),
            Err(SelectionError::InvalidImitation)
        );

        selection.set_joker_imitation(CardKind::Swap, &hand).unwrap();
        assert_eq!(selection.effective_kind(&hand), Some(&CardKind::Swap));

        // Selecting another card forgets the imitation
        selection.select_card(1, &hand);
        assert_eq!(selection.joker_imitation(), None);
    }

    #[test]
    fn test_changing_imitation_drops_stale_choices() {
        let fx = fixture(vec![Card::joker()]);
        let view = fx.game.perspective(fx.me).unwrap();
        let rules = GameRules::default();
        let mut selection = Selection::new();
        selection.select_card(0, view.hand());

        selection
            .set_joker_imitation(CardKind::Inferno, view.hand())
            .unwrap();
        selection
            .update_inferno_allocation(fx.own_path, 7, &rules)
            .unwrap();

        selection
            .set_joker_imitation(CardKind::Swap, view.hand())
            .unwrap();
        assert!(selection.inferno_plan().is_empty());

        selection.select_figure(fx.own_path, &view);
        selection.select_figure(fx.other_path, &view);
        assert_eq!(selection.target_figure(), Some(fx.other_path));

        selection.clear_joker_imitation(view.hand());
        assert_eq!(selection.target_figure(), None);
    }

    #[test]
    fn test_cancel_joker_resets_everything() {
        let hand = vec![Card::joker()];
        let mut selection = Selection::new();
        selection.select_card(0, &hand);
        selection.set_joker_imitation(CardKind::Flex, &hand).unwrap();

        selection.cancel_joker_imitation();
        assert!(selection.is_empty());
    }
}
