use std::fmt;
use std::io;

use gamelink_frame::FrameError;
use gamelink_session::{DisconnectReason, SessionError};
use gamelink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::NotConnected => TRANSPORT_ERROR,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::CorruptStream(_)
        | FrameError::PayloadTooLarge { .. }
        | FrameError::PayloadLengthMismatch { .. }
        | FrameError::UnsupportedType(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::ConnectionClosed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::UnreachableHost(err) | SessionError::Transport(err) => {
            transport_error(context, err)
        }
        SessionError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SessionError::SendFailed(_) | SessionError::NotConnected => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        SessionError::Frame(err) => frame_error(context, err),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

/// Exit status for a connection that ended without the caller asking.
pub fn disconnect_error(reason: &DisconnectReason) -> CliError {
    match reason {
        DisconnectReason::CorruptStream(_) => {
            CliError::new(DATA_INVALID, format!("connection closed: {reason}"))
        }
        _ => CliError::new(TRANSPORT_ERROR, format!("connection closed: {reason}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gamelink_frame::Corruption;

    use super::*;

    #[test]
    fn timeouts_map_to_124() {
        let err = SessionError::Timeout {
            address: "10.0.0.1:7777".into(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(session_error("connect failed", err).code, TIMEOUT);
    }

    #[test]
    fn refused_connect_is_transport_error() {
        let err = SessionError::UnreachableHost(TransportError::Connect {
            address: "127.0.0.1:1".into(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        });
        let cli = session_error("connect failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("connect failed: failed to connect to 127.0.0.1:1"));
    }

    #[test]
    fn corrupt_stream_is_data_invalid() {
        let reason = DisconnectReason::CorruptStream(Corruption::UnknownType(0x42));
        assert_eq!(disconnect_error(&reason).code, DATA_INVALID);
        assert_eq!(
            disconnect_error(&DisconnectReason::PeerClosed).code,
            TRANSPORT_ERROR
        );
    }

    #[test]
    fn unsupported_type_is_data_invalid() {
        let err = SessionError::Frame(FrameError::UnsupportedType(9));
        assert_eq!(session_error("send failed", err).code, DATA_INVALID);
    }
}
