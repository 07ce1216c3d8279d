//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding envelopes.
///
/// A `Decode` error from bytes received off the wire is the "malformed
/// envelope" condition: the peer sent something outside the schema, and the
/// connection that produced it is not worth keeping.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: bad JSON, unknown `kind` tag, missing
    /// required field, or a field of the wrong type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but is invalid at the protocol level —
    /// e.g. an empty display name in a `PlayerName` envelope.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
