//! Client configuration from environment variables.

use cat_core::{GameRules, RulesError};
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:7777";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} is not a valid UUID: {value}")]
    InvalidUuid { var: &'static str, value: String },

    #[error("{var} is not a valid number: {value}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Unsupported server URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid rules: {0}")]
    Rules(#[from] RulesError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub server_url: String,
    pub ws_url: String,
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub rules: GameRules,
}

impl ClientConfig {
    /// Read `CAT_SERVER_URL`, `CAT_WS_URL`, `CAT_GAME_ID`, `CAT_PLAYER_ID`,
    /// `CAT_TRACK_LENGTH` and `CAT_INFERNO_BUDGET`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_url = lookup("CAT_SERVER_URL")
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let ws_url = match lookup("CAT_WS_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => websocket_url(&server_url)?,
        };

        let uuid = |var: &'static str| -> Result<Uuid, ConfigError> {
            let value = lookup(var).ok_or(ConfigError::Missing(var))?;
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidUuid { var, value })
        };
        let game_id = uuid("CAT_GAME_ID")?;
        let player_id = uuid("CAT_PLAYER_ID")?;

        let mut rules = GameRules::default();
        if let Some(value) = lookup("CAT_TRACK_LENGTH") {
            rules.track_length = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "CAT_TRACK_LENGTH",
                    value,
                })?;
        }
        if let Some(value) = lookup("CAT_INFERNO_BUDGET") {
            rules.inferno_budget = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "CAT_INFERNO_BUDGET",
                    value,
                })?;
        }
        rules.validate()?;

        Ok(Self {
            server_url,
            ws_url,
            game_id,
            player_id,
            rules,
        })
    }
}

/// Push endpoint base for an HTTP server URL
fn websocket_url(server_url: &str) -> Result<String, ConfigError> {
    if let Some(rest) = server_url.strip_prefix("https://") {
        Ok(format!("wss://{}", rest))
    } else if let Some(rest) = server_url.strip_prefix("http://") {
        Ok(format!("ws://{}", rest))
    } else {
        Err(ConfigError::InvalidUrl(server_url.to_string()))
    }
}
