//! Local turn clock for display.
//!
//! Seeded from the server's remaining time whenever new state arrives and
//! ticking locally in between. The server enforces its own turn limit; this
//! clock only tells the player roughly how long they have.

use crate::game::GameView;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct TurnCountdown {
    owner: Option<usize>,
    round: u32,
    seeded_at: Instant,
    remaining_at_seed: Option<Duration>,
    turn_duration: Option<Duration>,
}

impl TurnCountdown {
    pub fn new(now: Instant) -> Self {
        Self {
            owner: None,
            round: 0,
            seeded_at: now,
            remaining_at_seed: None,
            turn_duration: None,
        }
    }

    /// Reseed from a freshly fetched state.
    ///
    /// Returns `true` when turn ownership changed.
    pub fn observe(&mut self, game: &GameView, now: Instant) -> bool {
        let owner = Some(game.current_player_index);
        let turn_changed = owner != self.owner || game.round_number != self.round;

        self.owner = owner;
        self.round = game.round_number;
        self.seeded_at = now;
        self.turn_duration = game.turn_duration.and_then(seconds);
        self.remaining_at_seed = game
            .turn_time_remaining
            .and_then(seconds)
            .or(self.turn_duration);

        turn_changed
    }

    /// Time left in the current turn, if the server runs a turn clock
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.seeded_at);
        self.remaining_at_seed
            .map(|remaining| remaining.saturating_sub(elapsed))
    }

    /// Fraction of the turn left, from 1.0 down to 0.0
    pub fn fraction_left(&self, now: Instant) -> Option<f64> {
        let total = self.turn_duration?.as_secs_f64();
        if total <= 0.0 {
            return None;
        }
        self.remaining(now)
            .map(|left| (left.as_secs_f64() / total).clamp(0.0, 1.0))
    }

    pub fn owner(&self) -> Option<usize> {
        self.owner
    }
}

/// Server seconds as a `Duration`; negative, NaN and out-of-range values are dropped
fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(current: usize, remaining: Option<f64>) -> GameView {
        GameView {
            uuid: uuid::Uuid::nil(),
            name: "clock".to_string(),
            host_id: None,
            game_started: true,
            game_over: false,
            players: Vec::new(),
            current_player_index: current,
            round_number: 1,
            last_played_card: None,
            turn_time_remaining: remaining,
            turn_duration: Some(20.0),
        }
    }

    #[test]
    fn test_counts_down_and_saturates() {
        let start = Instant::now();
        let mut clock = TurnCountdown::new(start);
        clock.observe(&game(0, Some(10.0)), start);

        assert_eq!(
            clock.remaining(start + Duration::from_secs(4)),
            Some(Duration::from_secs(6))
        );
        assert_eq!(
            clock.remaining(start + Duration::from_secs(30)),
            Some(Duration::ZERO)
        );
        assert_eq!(clock.fraction_left(start), Some(0.5));
    }

    #[test]
    fn test_reseeds_on_new_state() {
        let start = Instant::now();
        let mut clock = TurnCountdown::new(start);
        assert!(clock.observe(&game(0, Some(10.0)), start));

        let later = start + Duration::from_secs(5);
        assert!(!clock.observe(&game(0, Some(3.0)), later));
        assert_eq!(clock.remaining(later), Some(Duration::from_secs(3)));

        assert!(clock.observe(&game(1, None), later));
        assert_eq!(clock.remaining(later), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_no_clock_without_server_times() {
        let start = Instant::now();
        let mut clock = TurnCountdown::new(start);
        let mut state = game(0, None);
        state.turn_duration = None;
        clock.observe(&state, start);
        assert_eq!(clock.remaining(start), None);
        assert_eq!(clock.fraction_left(start), None);
    }

    #[test]
    fn test_out_of_range_server_times_ignored() {
        let start = Instant::now();
        let mut clock = TurnCountdown::new(start);
        let mut state = game(0, Some(1e20));
        state.turn_duration = Some(1e20);
        clock.observe(&state, start);
        assert_eq!(clock.remaining(start), None);
        assert_eq!(clock.fraction_left(start), None);

        state.turn_time_remaining = Some(-3.0);
        state.turn_duration = Some(f64::NAN);
        clock.observe(&state, start);
        assert_eq!(clock.remaining(start), None);

        state.turn_time_remaining = Some(1e20);
        state.turn_duration = Some(20.0);
        clock.observe(&state, start);
        assert_eq!(clock.remaining(start), Some(Duration::from_secs(20)));
    }
}
