use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::buffer::ByteBuffer;
use crate::error::{Corruption, FrameError, Result};

/// Packet type identifier: 1 byte.
pub const TYPE_SIZE: usize = 1;

/// Payload length field of length-prefixed packets: 2 bytes, big-endian.
pub const LENGTH_FIELD_SIZE: usize = 2;

/// Header of a length-prefixed packet: type (1) + length (2) = 3 bytes.
pub const PREFIXED_HEADER_SIZE: usize = TYPE_SIZE + LENGTH_FIELD_SIZE;

/// Default maximum wire size of one packet: the largest prefixed packet.
pub const DEFAULT_MAX_PACKET: usize = PREFIXED_HEADER_SIZE + u16::MAX as usize;

/// How the payload length of a packet type is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketLength {
    /// The payload is always exactly this many bytes; header is the type byte.
    Fixed(u16),
    /// The type byte is followed by a big-endian `u16` payload length.
    Prefixed,
}

impl PacketLength {
    /// Header size for packets framed by this rule.
    pub fn header_size(self) -> usize {
        match self {
            PacketLength::Fixed(_) => TYPE_SIZE,
            PacketLength::Prefixed => PREFIXED_HEADER_SIZE,
        }
    }
}

/// A complete packet, kept in its wire form.
///
/// The wire bytes are the header followed by the payload, so
/// [`Packet::wire_size`] is exactly what a dequeue hands to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    type_id: u8,
    header_len: usize,
    wire: Bytes,
}

impl Packet {
    /// Build a packet by encoding `payload` with the given rule.
    pub fn encode(rule: PacketLength, type_id: u8, payload: &[u8]) -> Result<Self> {
        let mut dst = BytesMut::with_capacity(rule.header_size() + payload.len());
        encode_with_rule(rule, type_id, payload, &mut dst)?;
        Ok(Self {
            type_id,
            header_len: rule.header_size(),
            wire: dst.freeze(),
        })
    }

    /// The packet type identifier.
    pub fn type_id(&self) -> u8 {
        self.type_id
    }

    /// The payload, without the header.
    pub fn payload(&self) -> &[u8] {
        &self.wire[self.header_len..]
    }

    /// Header plus payload, exactly as received.
    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    /// Header size of this packet.
    pub fn header_size(&self) -> usize {
        self.header_len
    }

    /// The total wire size of this packet (header + payload).
    pub fn wire_size(&self) -> usize {
        self.wire.len()
    }

    /// Consume the packet and return its wire bytes.
    pub fn into_wire(self) -> Bytes {
        self.wire
    }
}

/// Per-type framing rules for all 256 packet type identifiers.
#[derive(Clone, PartialEq, Eq)]
pub struct FramingTable {
    rules: [Option<PacketLength>; 256],
}

impl FramingTable {
    /// Every packet type is length-prefixed.
    pub fn prefixed() -> Self {
        Self {
            rules: [Some(PacketLength::Prefixed); 256],
        }
    }

    /// No packet type has a rule; build a catalogue from here.
    pub fn empty() -> Self {
        Self { rules: [None; 256] }
    }

    /// Declare `type_id` as a fixed-size packet with `payload_len` bytes.
    pub fn with_fixed(mut self, type_id: u8, payload_len: u16) -> Self {
        self.set(type_id, Some(PacketLength::Fixed(payload_len)));
        self
    }

    /// Declare `type_id` as length-prefixed.
    pub fn with_prefixed(mut self, type_id: u8) -> Self {
        self.set(type_id, Some(PacketLength::Prefixed));
        self
    }

    /// Replace the rule for `type_id`; `None` makes the type unknown.
    pub fn set(&mut self, type_id: u8, rule: Option<PacketLength>) {
        self.rules[usize::from(type_id)] = rule;
    }

    /// The rule for `type_id`, if the type is known.
    pub fn rule(&self, type_id: u8) -> Option<PacketLength> {
        self.rules[usize::from(type_id)]
    }

    /// Number of packet types with a rule.
    pub fn known_types(&self) -> usize {
        self.rules.iter().filter(|rule| rule.is_some()).count()
    }
}

impl Default for FramingTable {
    fn default() -> Self {
        Self::prefixed()
    }
}

impl fmt::Debug for FramingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fixed = self
            .rules
            .iter()
            .filter(|rule| matches!(rule, Some(PacketLength::Fixed(_))))
            .count();
        let prefixed = self
            .rules
            .iter()
            .filter(|rule| matches!(rule, Some(PacketLength::Prefixed)))
            .count();
        f.debug_struct("FramingTable")
            .field("fixed", &fixed)
            .field("prefixed", &prefixed)
            .field("unknown", &(256 - fixed - prefixed))
            .finish()
    }
}

/// Wire protocol variant selected when a session is initialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProtocolVariant {
    /// Every packet carries a 2-byte length after its type byte.
    #[default]
    Prefixed,
    /// Explicit per-type catalogue; types without a rule corrupt the stream.
    Catalogue(FramingTable),
}

impl ProtocolVariant {
    /// The framing table this variant frames with.
    pub fn table(&self) -> FramingTable {
        match self {
            ProtocolVariant::Prefixed => FramingTable::prefixed(),
            ProtocolVariant::Catalogue(table) => table.clone(),
        }
    }
}

/// Configuration for the packet framer.
#[derive(Debug, Clone)]
pub struct FramerConfig {
    /// Wire protocol variant. Default: every type length-prefixed.
    pub variant: ProtocolVariant,
    /// Maximum wire size (header + payload) of a single packet.
    pub max_packet_size: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            variant: ProtocolVariant::default(),
            max_packet_size: DEFAULT_MAX_PACKET,
        }
    }
}

/// Extracts complete packets from the front of a [`ByteBuffer`].
#[derive(Debug, Clone)]
pub struct Framer {
    table: FramingTable,
    max_packet_size: usize,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new(&FramerConfig::default())
    }
}

impl Framer {
    /// Create a framer from configuration.
    pub fn new(config: &FramerConfig) -> Self {
        Self {
            table: config.variant.table(),
            max_packet_size: config.max_packet_size,
        }
    }

    /// Try to extract one packet.
    ///
    /// `Ok(None)` means more data is needed; the buffer is left untouched.
    pub fn next_packet(&self, buf: &mut ByteBuffer) -> Result<Option<Packet>> {
        decode_packet(buf, &self.table, self.max_packet_size)
    }

    /// Extract every complete packet currently buffered, in order.
    ///
    /// Returns the number of packets handed to `sink`. Incomplete trailing
    /// bytes stay buffered for the next read.
    pub fn drain(&self, buf: &mut ByteBuffer, mut sink: impl FnMut(Packet)) -> Result<usize> {
        let mut count = 0usize;
        while let Some(packet) = self.next_packet(buf)? {
            sink(packet);
            count += 1;
        }
        Ok(count)
    }

    /// Encode a packet with this framer's table.
    pub fn encode(&self, type_id: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
        encode_packet(&self.table, type_id, payload, dst)
    }

    /// Build a standalone packet with this framer's table.
    pub fn packet(&self, type_id: u8, payload: &[u8]) -> Result<Packet> {
        let rule = self
            .table
            .rule(type_id)
            .ok_or(FrameError::UnsupportedType(type_id))?;
        Packet::encode(rule, type_id, payload)
    }

    /// The framing table in use.
    pub fn table(&self) -> &FramingTable {
        &self.table
    }

    /// Maximum wire size of a single packet.
    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// fixed:     ┌───────────┬──────────────────────────┐
///            │ Type (1B) │ Payload (catalogue size) │
///            └───────────┴──────────────────────────┘
/// prefixed:  ┌───────────┬─────────────┬────────────────────┐
///            │ Type (1B) │ Length (2B  │ Payload            │
///            │           │ big-endian) │ (Length bytes)     │
///            └───────────┴─────────────┴────────────────────┘
/// ```
pub fn encode_packet(
    table: &FramingTable,
    type_id: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let rule = table
        .rule(type_id)
        .ok_or(FrameError::UnsupportedType(type_id))?;
    encode_with_rule(rule, type_id, payload, dst)
}

fn encode_with_rule(
    rule: PacketLength,
    type_id: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    match rule {
        PacketLength::Fixed(expected) => {
            if payload.len() != usize::from(expected) {
                return Err(FrameError::PayloadLengthMismatch {
                    type_id,
                    expected: usize::from(expected),
                    actual: payload.len(),
                });
            }
            dst.reserve(TYPE_SIZE + payload.len());
            dst.put_u8(type_id);
            dst.put_slice(payload);
        }
        PacketLength::Prefixed => {
            let len = u16::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
                size: payload.len(),
                max: usize::from(u16::MAX),
            })?;
            dst.reserve(PREFIXED_HEADER_SIZE + payload.len());
            dst.put_u8(type_id);
            dst.put_u16(len);
            dst.put_slice(payload);
        }
    }
    Ok(())
}

/// Decode one packet from the front of a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete packet yet.
/// On success, consumes exactly the packet's bytes from the buffer.
pub fn decode_packet(
    src: &mut ByteBuffer,
    table: &FramingTable,
    max_packet_size: usize,
) -> Result<Option<Packet>> {
    if src.available() < TYPE_SIZE {
        return Ok(None); // Need more data
    }

    let type_id = src.peek(TYPE_SIZE)?[0];
    let rule = table
        .rule(type_id)
        .ok_or(FrameError::CorruptStream(Corruption::UnknownType(type_id)))?;

    let header_len = rule.header_size();
    if src.available() < header_len {
        return Ok(None); // Need more data
    }

    let payload_len = match rule {
        PacketLength::Fixed(len) => usize::from(len),
        PacketLength::Prefixed => {
            let header = src.peek(header_len)?;
            usize::from(u16::from_be_bytes([header[1], header[2]]))
        }
    };

    let total = header_len + payload_len;
    if total > max_packet_size {
        return Err(FrameError::CorruptStream(Corruption::Oversize {
            type_id,
            size: total,
            max: max_packet_size,
        }));
    }

    if src.available() < total {
        return Ok(None); // Need more data
    }

    let wire = src.consume(total)?;
    Ok(Some(Packet {
        type_id,
        header_len,
        wire,
    }))
}
