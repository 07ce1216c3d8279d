//! Core protocol types for Callout's wire format.
//!
//! This module defines every type that travels "on the wire" — the
//! structures that get serialized to bytes, sent over the TCP connection,
//! and deserialized on the other side.
//!
//! The shapes here are the contract between server and client. The encoding
//! format (JSON today) can change; the tag names and field names cannot.

use serde::{Deserialize, Serialize};

use std::fmt;

/// The sender name the server uses for its own chat-style messages.
pub const SERVER_SENDER: &str = "SERVER";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player within one session.
///
/// A newtype wrapper over `u64` so a player id can't be confused with any
/// other counter in the codebase. `#[serde(transparent)]` makes a
/// `PlayerId(2)` serialize as just `2`, not `{ "0": 2 }`.
///
/// Ids are assigned by the server at admission and never reused; they are
/// server-internal bookkeeping, not part of the wire schema (players are
/// named on the wire by their display name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Role — the dealt card
// ---------------------------------------------------------------------------

/// The secret role dealt to each of the three players.
///
/// Exactly one of each exists per session. The deal is a random permutation,
/// fixed once made:
///
/// - **Privileged** — the only player allowed to end the game, by accusing
///   another player.
/// - **Target** — the player the Privileged one must pick for the shared win.
/// - **Neutral** — the third wheel. Wins alone whenever the Privileged
///   player accuses the wrong person.
///
/// Serialized by variant name (`"Privileged"` etc.), which is what the
/// `RoleReveal` payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Privileged,
    Target,
    Neutral,
}

impl Role {
    /// All three roles, one of each — the deck before shuffling.
    pub const ALL: [Role; 3] = [Role::Privileged, Role::Target, Role::Neutral];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Privileged => write!(f, "Privileged"),
            Role::Target => write!(f, "Target"),
            Role::Neutral => write!(f, "Neutral"),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// The top-level message unit. Every framed payload on the wire is exactly
/// one `Envelope`.
///
/// `#[serde(tag = "kind")]` produces internally tagged JSON:
///
/// ```json
/// { "kind": "PlayerChat", "message": "hello" }
/// ```
///
/// The enum is closed: decoding an unknown `kind`, or a known kind with a
/// missing or mistyped field, is a decode error — never a silent no-op.
/// Every dispatch site matches exhaustively, so adding a variant is a
/// compile error until each handler decides what to do with it.
///
/// Variants double as the construction API; each kind can only be built
/// with exactly its required fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Envelope {
    /// Client → Server: the first (and only) admission message.
    /// `name` is the display name other players will see.
    PlayerName { name: String },

    /// Client → Server: a free-form chat line to relay to the other players.
    PlayerChat { message: String },

    /// Client → Server: the terminal accusation. Only honored from the
    /// player holding [`Role::Privileged`]. `target_name` is the display
    /// name of the accused player.
    PlayerDecision { target_name: String },

    /// Server → Client: a chat line, either relayed from another player or
    /// originated by the server itself (`sender` == [`SERVER_SENDER`]).
    ServerChat { message: String, sender: String },

    /// Server → Client: the player's dealt role. Sent exactly once, when
    /// the third player joins and the deal happens.
    RoleReveal { role: Role },
}

// =========================================================================
// Tests
// =========================================================================
