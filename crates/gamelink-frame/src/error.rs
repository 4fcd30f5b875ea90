/// Errors that can occur while buffering, framing, reading or writing packets.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer unparsed bytes are buffered than the operation needs.
    #[error("insufficient data ({needed} bytes needed, {available} available)")]
    InsufficientData { needed: usize, available: usize },

    /// The byte stream can no longer be trusted past this point.
    #[error("corrupt stream: {0}")]
    CorruptStream(Corruption),

    /// A payload is too large to be encoded for its packet type.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A fixed-size packet type was given a payload of the wrong length.
    #[error("packet type 0x{type_id:02X} carries exactly {expected} payload bytes, got {actual}")]
    PayloadLengthMismatch {
        type_id: u8,
        expected: usize,
        actual: usize,
    },

    /// The framing table has no rule for a packet type being encoded.
    #[error("packet type 0x{0:02X} has no framing rule")]
    UnsupportedType(u8),

    /// An I/O error occurred while reading or writing the stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection (a read returned zero bytes).
    #[error("connection closed by peer")]
    ConnectionClosed,
}

/// Why a byte stream was declared corrupt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Corruption {
    /// The framing table has no rule for this packet type.
    #[error("unknown packet type 0x{0:02X}")]
    UnknownType(u8),

    /// The declared packet size exceeds the configured maximum.
    #[error("packet type 0x{type_id:02X} declares {size} bytes, max {max}")]
    Oversize { type_id: u8, size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
