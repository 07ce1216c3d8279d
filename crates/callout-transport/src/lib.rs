//! TCP transport layer for Callout.
//!
//! Provides the [`TcpAcceptor`]/[`TcpConnection`] pair and the explicit
//! length-prefix [`framing`] discipline that turns a raw byte stream into a
//! sequence of whole message payloads. A single socket read is never
//! guaranteed to align with message boundaries; everything above this crate
//! gets to pretend it is.

mod error;
pub mod framing;
mod tcp;

pub use error::TransportError;
pub use tcp::{FrameReader, FrameWriter, TcpAcceptor, TcpConnection};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
