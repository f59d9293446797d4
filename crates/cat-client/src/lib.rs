//! Networked client for CAT games.
//!
//! - [`transport`]: REST and push access to the game server
//! - [`coordinator`]: Keeps one game's state and the player's selection in sync
//! - [`config`]: Environment configuration

pub mod config;
pub mod coordinator;
pub mod protocol;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use coordinator::{SessionEvent, SubmitError, SyncCoordinator, SyncError, SyncPhase};
pub use protocol::{PlayCardRequest, PlayResponse, PushEvent};
pub use transport::{HttpTransport, Transport, TransportError};
