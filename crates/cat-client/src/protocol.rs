//! Wire messages exchanged with the CAT game server.

use cat_core::ActionDetails;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frames pushed by the server over the game's WebSocket.
///
/// Pushes carry no state; an `update` only tells the client to refetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushEvent {
    /// Game state changed on the server
    Update,

    /// The game ended or was shut down
    Closed {
        #[serde(default)]
        reason: String,
    },
}

/// Body of `POST /game/{game_id}/play`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayCardRequest {
    pub player_uuid: Uuid,
    pub card_index: usize,
    pub action_details: ActionDetails,
}

/// Successful play response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayResponse {
    #[serde(default)]
    pub message: String,
}

/// Error body the server attaches to a 4xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cat_core::{CardAction, Imitation};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_push_event_frames() {
        let update: PushEvent = serde_json::from_str(r#"{"type":"update"}"#).unwrap();
        assert_eq!(update, PushEvent::Update);

        let closed: PushEvent =
            serde_json::from_str(r#"{"type":"closed","reason":"host left"}"#).unwrap();
        assert_eq!(
            closed,
            PushEvent::Closed {
                reason: "host left".to_string()
            }
        );

        assert!(serde_json::from_str::<PushEvent>(r#"{"type":"chat"}"#).is_err());
    }

    #[test]
    fn test_play_request_shape() {
        let player = Uuid::new_v4();
        let figure = Uuid::new_v4();
        let request = PlayCardRequest {
            player_uuid: player,
            card_index: 2,
            action_details: ActionDetails {
                action: CardAction::Start {
                    figure_uuid: figure,
                },
                imitation: Some(Imitation {
                    imitate_card_name: "Start".to_string(),
                    move_values: Some(vec![1, 11]),
                }),
            },
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "player_uuid": player,
                "card_index": 2,
                "action_details": {
                    "action": "start",
                    "figure_uuid": figure,
                    "imitate_card_name": "Start",
                    "move_values": [1, 11],
                }
            })
        );
    }

    #[test]
    fn test_error_body() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":"Not your turn"}"#).unwrap();
        assert_eq!(body.detail, "Not your turn");
    }
}
