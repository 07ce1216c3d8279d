//! TCP transport: listener, connection, and framed reader/writer halves.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use crate::framing::{FrameDecoder, encode_frame};
use crate::{ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Size of the read buffer handed to the socket. Frames larger than this
/// simply arrive over several reads; the decoder reassembles them.
const READ_CHUNK: usize = 4096;

/// A TCP listener that accepts framed connections.
pub struct TcpAcceptor {
    listener: TcpListener,
}

impl TcpAcceptor {
    /// Binds a listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    ///
    /// Binding to port 0 and reading the address back is how the tests get
    /// a free port.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and accepts the next incoming connection.
    pub async fn accept(&self) -> Result<TcpConnection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, "accepted connection");

        Ok(TcpConnection { id, stream })
    }
}

/// One accepted (or dialed) TCP connection, not yet split.
///
/// The connection itself is inert; call [`into_split`](Self::into_split) to
/// get the framed halves. Splitting gives each half a single owner — the
/// read half lives in the receive loop, the write half in the write loop —
/// so the socket is released exactly when both owners are done with it.
pub struct TcpConnection {
    id: ConnectionId,
    stream: TcpStream,
}

impl TcpConnection {
    /// Dials a server. Used by the client binary and the test harnesses.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::ConnectFailed)?;
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        Ok(Self { id, stream })
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Splits the connection into independently owned framed halves.
    pub fn into_split(self) -> (FrameReader, FrameWriter) {
        let (read, write) = self.stream.into_split();
        (
            FrameReader {
                id: self.id,
                half: read,
                decoder: FrameDecoder::new(),
            },
            FrameWriter {
                id: self.id,
                half: write,
            },
        )
    }
}

/// The receiving half: reads socket chunks and yields whole frame payloads.
pub struct FrameReader {
    id: ConnectionId,
    half: OwnedReadHalf,
    decoder: FrameDecoder,
}

impl FrameReader {
    /// Receives the next complete payload from the peer.
    ///
    /// Returns `Ok(None)` when the peer closes the connection cleanly (a
    /// zero-byte read at a frame boundary). A close in the middle of a
    /// frame is [`TransportError::Truncated`].
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            if let Some(payload) = self.decoder.next_frame()? {
                return Ok(Some(payload));
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self
                .half
                .read(&mut chunk)
                .await
                .map_err(TransportError::ReceiveFailed)?;

            if n == 0 {
                if self.decoder.has_partial() {
                    return Err(TransportError::Truncated {
                        buffered: self.decoder.buffered_len(),
                    });
                }
                tracing::debug!(id = %self.id, "peer closed connection");
                return Ok(None);
            }
            self.decoder.extend(&chunk[..n]);
        }
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

/// The sending half: frames payloads and writes them to the socket.
pub struct FrameWriter {
    id: ConnectionId,
    half: OwnedWriteHalf,
}

impl FrameWriter {
    /// Sends one payload as a single frame.
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let frame = encode_frame(payload)?;
        self.half
            .write_all(&frame)
            .await
            .map_err(TransportError::SendFailed)
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}
