//! # Callout server
//!
//! Session coordinator for a three-player bluff game over TCP.
//!
//! The server admits exactly three players, deals each a secret role
//! ([`Role`](callout_protocol::Role)), relays their chat, and resolves the
//! game when the Privileged player accuses someone. One session per
//! process; the interesting parts live in:
//!
//! - [`session::GameSession`] — phase machine, quorum latch, resolver
//! - [`registry::PlayerRegistry`] — the roster and broadcast fan-out
//! - [`deal::RoleDeck`] — the one-shot random role deal
//! - [`GameServer`] — builder, accept loop, and the per-connection handlers

pub mod config;
pub mod deal;
mod error;
mod handler;
pub mod registry;
mod server;
pub mod session;

pub use config::ServerConfig;
pub use error::{GameError, ServerError};
pub use server::{GameServer, GameServerBuilder, SessionHandle};
pub use session::{GamePhase, GameSession};
