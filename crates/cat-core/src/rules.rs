//! Game balance constants shared with the server.
//!
//! The server is the source of truth for these numbers. They are kept as
//! configuration so a client talking to a server with different constants can
//! be adjusted without touching the geometry or resolver code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from an inconsistent rules configuration
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RulesError {
    #[error("Track length must be positive")]
    EmptyTrack,

    #[error("Finish lane length must be between 1 and 99, got {0}")]
    InvalidFinishLane(u8),

    #[error("Start spacing {spacing} does not fit four players on a track of {track_length}")]
    InvalidStartSpacing { spacing: u16, track_length: u16 },

    #[error("Inferno budget must be positive")]
    EmptyInfernoBudget,
}

/// Numeric rules the client needs to interpret server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Number of fields on the shared circular track
    pub track_length: u16,
    /// Fields in each color's private finish lane
    pub finish_lane_length: u8,
    /// Home slots (and figures) per player
    pub home_slots: u8,
    /// Distance between two consecutive players' start fields
    pub start_spacing: u16,
    /// Move points an Inferno card distributes
    pub inferno_budget: u8,
}

impl GameRules {
    /// Raw positions at or above this value encode a finish lane slot
    pub const FINISH_BASE: i32 = 100;

    /// Check that the constants describe a playable board
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.track_length == 0 {
            return Err(RulesError::EmptyTrack);
        }
        if self.finish_lane_length == 0 || i32::from(self.finish_lane_length) >= Self::FINISH_BASE {
            return Err(RulesError::InvalidFinishLane(self.finish_lane_length));
        }
        if self.start_spacing == 0
            || u32::from(self.start_spacing) * 3 >= u32::from(self.track_length)
        {
            return Err(RulesError::InvalidStartSpacing {
                spacing: self.start_spacing,
                track_length: self.track_length,
            });
        }
        if self.inferno_budget == 0 {
            return Err(RulesError::EmptyInfernoBudget);
        }
        Ok(())
    }

    /// Start field (launch cell) of the player in the given turn slot.
    ///
    /// An empty track has no fields; every slot maps to 0.
    pub fn start_field(&self, slot: u8) -> u16 {
        let track = u32::from(self.track_length);
        if track == 0 {
            return 0;
        }
        // The remainder is below `track_length`, so it fits back into u16
        ((u32::from(slot) * u32::from(self.start_spacing)) % track) as u16
    }

    /// Last path field before a player enters their finish lane
    pub fn finishing_field(&self, slot: u8) -> u16 {
        let track = u32::from(self.track_length);
        if track == 0 {
            return 0;
        }
        ((u32::from(self.start_field(slot)) + track - 1) % track) as u16
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            track_length: 54,
            finish_lane_length: 4,
            home_slots: 4,
            start_spacing: 14,
            inferno_budget: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_valid() {
        assert_eq!(GameRules::default().validate(), Ok(()));
    }

    #[test]
    fn test_start_and_finishing_fields() {
        let rules = GameRules::default();
        assert_eq!(rules.start_field(0), 0);
        assert_eq!(rules.start_field(3), 42);
        assert_eq!(rules.finishing_field(0), 53);
        assert_eq!(rules.finishing_field(1), 13);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let rules = GameRules {
            track_length: 30,
            ..GameRules::default()
        };
        assert!(matches!(
            rules.validate(),
            Err(RulesError::InvalidStartSpacing { .. })
        ));

        let rules = GameRules {
            inferno_budget: 0,
            ..GameRules::default()
        };
        assert_eq!(rules.validate(), Err(RulesError::EmptyInfernoBudget));
    }

    #[test]
    fn test_large_spacing_rejected_without_overflow() {
        let rules: GameRules = serde_json::from_str(r#"{"start_spacing": 30000}"#).unwrap();
        assert_eq!(
            rules.validate(),
            Err(RulesError::InvalidStartSpacing {
                spacing: 30000,
                track_length: 54
            })
        );
        assert_eq!(rules.start_field(3), ((3 * 30000) % 54) as u16);

        let rules = GameRules {
            track_length: u16::MAX,
            start_spacing: u16::MAX / 4,
            ..GameRules::default()
        };
        assert_eq!(rules.validate(), Ok(()));
        assert_eq!(rules.start_field(3), 3 * (u16::MAX / 4));
        assert_eq!(rules.finishing_field(0), u16::MAX - 1);
    }

    #[test]
    fn test_empty_track_has_no_fields() {
        let rules = GameRules {
            track_length: 0,
            ..GameRules::default()
        };
        assert_eq!(rules.validate(), Err(RulesError::EmptyTrack));
        assert_eq!(rules.start_field(2), 0);
        assert_eq!(rules.finishing_field(2), 0);
    }

    #[test]
    fn test_partial_rules_deserialize_with_defaults() {
        let rules: GameRules = serde_json::from_str(r#"{"track_length": 56}"#).unwrap();
        assert_eq!(rules.track_length, 56);
        assert_eq!(rules.inferno_budget, 7);
    }
}
