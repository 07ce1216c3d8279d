/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener or accepting a connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Establishing an outbound connection failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Writing a frame to the socket failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading from the socket failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A frame (or a claimed frame length) exceeded [`MAX_FRAME_LEN`].
    ///
    /// [`MAX_FRAME_LEN`]: crate::framing::MAX_FRAME_LEN
    #[error("frame of {len} bytes exceeds the maximum frame length")]
    FrameTooLarge { len: usize },

    /// The peer closed the connection in the middle of a frame.
    ///
    /// A close at a frame boundary is a normal disconnect (`recv` returns
    /// `Ok(None)`); a close mid-frame means data was lost.
    #[error("connection closed mid-frame with {buffered} bytes pending")]
    Truncated { buffered: usize },
}
