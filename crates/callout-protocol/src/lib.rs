//! Wire protocol for Callout.
//!
//! This crate defines the "language" that the server and its three clients
//! speak:
//!
//! - **Types** ([`Envelope`], [`Role`], [`PlayerId`]) — the message
//!   structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (framed bytes) and the game
//! session (player identity, phases). It doesn't know about sockets or
//! rosters — it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (frames) → Protocol (Envelope) → Session (game state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Envelope, PlayerId, Role, SERVER_SENDER};
