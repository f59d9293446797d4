//! CAT - client-side interaction core
//!
//! This crate holds everything the game client decides locally, without
//! touching the network:
//! - Board geometry for drawing figures on the 15x15 grid
//! - Card model and the card-type catalog
//! - A read-only mirror of the server's game state
//! - The player's tentative selection and its transition rules
//! - Card semantics: which actions the selection allows
//!
//! # Architecture
//!
//! The server owns every rule. This crate only expresses intentions: a
//! complete selection becomes a [`PlannedAction`], which the client sends
//! and the server accepts or rejects. The crate compiles natively and, with
//! the `wasm` feature, to WebAssembly for a browser front end.
//!
//! # Modules
//!
//! - [`rules`]: Balance constants (track length, Inferno budget)
//! - [`board`]: Position to cell mapping and reverse lookup
//! - [`cards`]: Hand cards and the catalog
//! - [`game`]: Authoritative state mirror
//! - [`selection`]: Selection state
//! - [`actions`]: Card semantics resolver and action payloads
//! - [`countdown`]: Local turn clock

pub mod actions;
pub mod board;
pub mod cards;
pub mod countdown;
pub mod game;
pub mod player;
pub mod rules;
pub mod selection;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{
    effective_card, requirements, resolve, submittable_actions, ActionDetails, CardAction,
    Direction, EffectiveCard, Imitation, InfernoMove, PlannedAction, Requirement, ResolveError,
};
pub use board::{BoardGeometry, BoardPosition, Cell, CellRole, GeometryError, Tile};
pub use cards::{Card, CardCatalog, CardKind};
pub use countdown::TurnCountdown;
pub use game::{GameView, Perspective};
pub use player::{FigureId, FigureView, HandView, PlayerColor, PlayerView, TurnSlot};
pub use rules::{GameRules, RulesError};
pub use selection::{Selection, SelectionError};
