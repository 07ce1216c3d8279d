//! Length-prefix framing: turning a byte stream into whole messages.
//!
//! A TCP stream has no message boundaries — one `read` can return half an
//! envelope, or two envelopes glued together. This module imposes the
//! boundary explicitly: every frame on the wire is a 4-byte big-endian
//! payload length followed by exactly that many payload bytes.
//!
//! [`encode_frame`] produces the bytes to write for one payload.
//! [`FrameDecoder`] is the receiving side: feed it whatever byte chunks the
//! socket hands you, in any split, and it yields complete payloads in order
//! — never a partial frame, never two frames merged. Leftover bytes stay
//! buffered for the next feed.

use crate::TransportError;

/// Maximum allowed payload length. A chat protocol has no business moving
/// more than this in one message; the cap bounds allocation when a peer
/// sends a hostile or corrupt length prefix.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Width of the length prefix on the wire.
const PREFIX_LEN: usize = 4;

/// Encodes one payload as a length-prefixed frame.
///
/// # Errors
/// Returns [`TransportError::FrameTooLarge`] if the payload exceeds
/// [`MAX_FRAME_LEN`].
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, TransportError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge { len: payload.len() });
    }
    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Incremental frame decoder with leftover buffering.
///
/// Usage: [`extend`](Self::extend) with each chunk read from the socket,
/// then drain complete frames with [`next_frame`](Self::next_frame) until it
/// returns `Ok(None)`.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly read bytes to the internal buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pops the next complete payload, if one is fully buffered.
    ///
    /// Returns `Ok(None)` when more bytes are needed. The length prefix is
    /// validated before any payload is read, so an oversize or corrupt
    /// prefix fails fast without waiting for 4 GiB that will never come.
    ///
    /// # Errors
    /// Returns [`TransportError::FrameTooLarge`] on a prefix above
    /// [`MAX_FRAME_LEN`].
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.buf.len() < PREFIX_LEN {
            return Ok(None);
        }
        let mut prefix = [0u8; PREFIX_LEN];
        prefix.copy_from_slice(&self.buf[..PREFIX_LEN]);
        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge { len });
        }
        if self.buf.len() < PREFIX_LEN + len {
            return Ok(None);
        }
        let payload = self.buf[PREFIX_LEN..PREFIX_LEN + len].to_vec();
        self.buf.drain(..PREFIX_LEN + len);
        Ok(Some(payload))
    }

    /// `true` if bytes of an unfinished frame are still buffered.
    ///
    /// Used to distinguish a clean peer close (EOF at a frame boundary)
    /// from a connection cut mid-message.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Number of buffered bytes that don't yet form a complete frame.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }
}
