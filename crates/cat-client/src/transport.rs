//! Network access to the game server.
//!
//! The coordinator only talks to a [`Transport`]; [`HttpTransport`] is the
//! production implementation (REST over `reqwest`, pushes over a WebSocket).

use crate::protocol::{ErrorBody, PlayCardRequest, PlayResponse, PushEvent};
use async_trait::async_trait;
use cat_core::{CardCatalog, GameView};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Transport failures, cloneable so a shared fetch can hand them to every waiter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection problem or server-side failure
    #[error("Network error: {0}")]
    Network(String),

    /// The server refused the request
    #[error("Rejected ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// The response could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Everything but a rule rejection may succeed on a later fetch
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Rejected { .. })
    }
}

/// Everything the coordinator needs from the server.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Personalized game state for one player
    async fn fetch_state(&self, game_id: Uuid, player_id: Uuid)
        -> Result<GameView, TransportError>;

    /// Submit a card play
    async fn submit_action(
        &self,
        game_id: Uuid,
        request: &PlayCardRequest,
    ) -> Result<PlayResponse, TransportError>;

    /// Static list of card types
    async fn fetch_catalog(&self) -> Result<CardCatalog, TransportError>;

    /// Open the push channel. The channel ends when the connection drops;
    /// dropping the receiver closes the connection.
    async fn subscribe(
        &self,
        game_id: Uuid,
        player_id: Uuid,
    ) -> Result<mpsc::UnboundedReceiver<PushEvent>, TransportError>;
}

/// REST + WebSocket transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    ws_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ws_url: ws_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn read_json<R: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<R, TransportError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if status.is_client_error() {
            let reason = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.detail)
                .unwrap_or(body);
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                reason,
            });
        }
        if !status.is_success() {
            return Err(TransportError::Network(format!(
                "Server responded with {}",
                status
            )));
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

fn network(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.to_string())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_state(
        &self,
        game_id: Uuid,
        player_id: Uuid,
    ) -> Result<GameView, TransportError> {
        let url = format!(
            "{}/game/{}/state?player_id={}",
            self.base_url, game_id, player_id
        );
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await.map_err(network)?;
        Self::read_json(response).await
    }

    async fn submit_action(
        &self,
        game_id: Uuid,
        request: &PlayCardRequest,
    ) -> Result<PlayResponse, TransportError> {
        let url = format!("{}/game/{}/play", self.base_url, game_id);
        debug!("POST {} card {}", url, request.card_index);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(network)?;
        Self::read_json(response).await
    }

    async fn fetch_catalog(&self) -> Result<CardCatalog, TransportError> {
        let url = format!("{}/game/cards", self.base_url);
        let response = self.client.get(&url).send().await.map_err(network)?;
        Self::read_json(response).await
    }

    async fn subscribe(
        &self,
        game_id: Uuid,
        player_id: Uuid,
    ) -> Result<mpsc::UnboundedReceiver<PushEvent>, TransportError> {
        let url = format!("{}/ws/{}/{}", self.ws_url, game_id, player_id);
        let (mut ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        info!("Push channel connected for game {}", game_id);

        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    msg = ws_stream.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<PushEvent>(&text) {
                                Ok(event) => {
                                    if tx.send(event).is_err() {
                                        break;
                                    }
                                }
                                Err(_) => warn!("Ignoring unknown push frame: {}", text),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Push channel closed by server");
                            break;
                        }
                        Some(Err(e)) => {
                            warn!("Push channel error: {}", e);
                            break;
                        }
                        _ => {}
                    }
                }
            }
        });

        Ok(rx)
    }
}
