//! Error types for the session coordinator.

use callout_protocol::{PlayerId, ProtocolError, Role};
use callout_transport::TransportError;

use crate::session::GamePhase;

/// Errors produced by the game rules themselves.
///
/// The variants split into three families the connection handler treats
/// differently: polite rejections that keep the session going (`Forbidden`,
/// `InvalidTarget`), admission refusals (`RegistryFull`), and internal
/// invariant breaches that no well-behaved client can trigger
/// (`AlreadyDealt`, `RoleNotAssigned`, `InvalidPhase`).
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The roster already holds three players. The caller closes the
    /// rejected connection; there is nothing to retry.
    #[error("the session already has three players")]
    RegistryFull,

    /// A second role deal was attempted in the same session.
    #[error("roles have already been dealt")]
    AlreadyDealt,

    /// A role lookup happened before the deal.
    #[error("no player holds {0} yet")]
    RoleNotAssigned(Role),

    /// The operation is not allowed in the session's current phase.
    #[error("{action} is not allowed while the session is {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: GamePhase,
    },

    /// A player without the Privileged role tried to end the game.
    /// The attempt is rejected; the connection and the session continue.
    #[error("only the Privileged player may accuse someone")]
    Forbidden(PlayerId),

    /// The accusation named an unknown player, or the accuser themselves.
    /// Rejected; the connection and the session continue.
    #[error("\"{0}\" is not a player you can accuse")]
    InvalidTarget(String),

    /// The peer sent a well-formed envelope of a kind it has no business
    /// sending (e.g. a second `PlayerName`, or a server-to-client kind).
    /// The connection is dropped.
    #[error("unexpected {kind} envelope from client")]
    UnexpectedEnvelope { kind: &'static str },
}

/// Top-level error for the server binary and connection handlers.
///
/// `#[from]` on each variant lets `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (accept, frame read/write).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game-rule error that terminates a connection.
    #[error(transparent)]
    Game(#[from] GameError),
}
