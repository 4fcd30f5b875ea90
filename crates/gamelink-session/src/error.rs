use std::time::Duration;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// `initialize` or `connect` was called while the session is initialized
    /// or a connection is live.
    #[error("session already initialized")]
    AlreadyInitialized,

    /// The server address could not be resolved or refused the connection.
    #[error("host unreachable: {0}")]
    UnreachableHost(#[source] gamelink_transport::TransportError),

    /// The connection attempt timed out.
    #[error("connecting to {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    /// The operation needs a connected session.
    #[error("session not connected")]
    NotConnected,

    /// Writing to the socket failed; the session is closing.
    #[error("send failed: {0}")]
    SendFailed(#[source] gamelink_frame::FrameError),

    /// The caller's buffer cannot hold the next packet; the packet stays queued.
    #[error("buffer too small ({capacity} bytes, next packet needs {required})")]
    BufferTooSmall { required: usize, capacity: usize },

    /// Frame-level error (e.g. encoding a payload for `send_packet`).
    #[error("frame error: {0}")]
    Frame(#[from] gamelink_frame::FrameError),

    /// Transport-level error while setting up a connected socket.
    #[error("transport error: {0}")]
    Transport(gamelink_transport::TransportError),
}

impl From<gamelink_transport::TransportError> for SessionError {
    fn from(err: gamelink_transport::TransportError) -> Self {
        use gamelink_transport::TransportError;

        match err {
            TransportError::Timeout { address, timeout } => {
                SessionError::Timeout { address, timeout }
            }
            TransportError::Resolve { .. } | TransportError::Connect { .. } => {
                SessionError::UnreachableHost(err)
            }
            other => SessionError::Transport(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
