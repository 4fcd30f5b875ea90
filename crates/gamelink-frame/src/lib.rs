//! Stream-to-packet framing and channel classification.
//!
//! TCP delivers bytes, not packets. This crate turns the byte stream coming
//! off a game-server socket into complete [`Packet`] records:
//! - a 1-byte packet type identifier
//! - for length-prefixed types, a 2-byte big-endian payload length
//! - the payload (fixed per type, or as declared)
//!
//! Partial packets stay in the [`ByteBuffer`] until the next read completes
//! them. Every packet is then routed to the game or system [`Channel`].

pub mod buffer;
pub mod channel;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use buffer::ByteBuffer;
pub use channel::{
    packet_name, Channel, Classifier, CONNECTION_ACCEPTED, CONNECTION_INFO,
    CONNECTION_TERMINATED, KEEPALIVE, SERVER_NOTICE, SYSTEM_PACKET_TYPES,
};
pub use codec::{
    decode_packet, encode_packet, Framer, FramerConfig, FramingTable, Packet, PacketLength,
    ProtocolVariant, DEFAULT_MAX_PACKET, LENGTH_FIELD_SIZE, PREFIXED_HEADER_SIZE, TYPE_SIZE,
};
pub use error::{Corruption, FrameError, Result};
pub use reader::{PacketReader, DEFAULT_READ_CHUNK_SIZE};
pub use writer::PacketWriter;
