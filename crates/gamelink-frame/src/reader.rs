use std::io::{ErrorKind, Read};
use std::time::Duration;

use gamelink_transport::GameStream;
use tracing::{debug, trace};

use crate::buffer::ByteBuffer;
use crate::codec::{Framer, Packet};
use crate::error::{FrameError, Result};

/// Default size of a single socket read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete packets from any `Read` stream.
///
/// Handles partial reads internally. Callers always get complete packets.
pub struct PacketReader<T> {
    inner: T,
    buf: ByteBuffer,
    framer: Framer,
    chunk: Vec<u8>,
}

impl<T: Read> PacketReader<T> {
    /// Create a new packet reader with the default framer.
    pub fn new(inner: T) -> Self {
        Self::with_framer(inner, Framer::default())
    }

    /// Create a new packet reader with an explicit framer.
    pub fn with_framer(inner: T, framer: Framer) -> Self {
        Self::with_framer_and_chunk_size(inner, framer, DEFAULT_READ_CHUNK_SIZE)
    }

    /// Create a new packet reader with an explicit framer and read size.
    pub fn with_framer_and_chunk_size(inner: T, framer: Framer, chunk_size: usize) -> Self {
        Self {
            inner,
            buf: ByteBuffer::new(),
            framer,
            chunk: vec![0u8; chunk_size.max(1)],
        }
    }

    /// Perform one read from the stream and buffer what arrived (blocking).
    ///
    /// Returns the number of bytes appended. A zero-byte read is reported
    /// as `Err(FrameError::ConnectionClosed)`.
    pub fn fill(&mut self) -> Result<usize> {
        loop {
            match self.inner.read(&mut self.chunk) {
                Ok(0) => {
                    debug!(unframed = self.buf.available(), "stream reached EOF");
                    return Err(FrameError::ConnectionClosed);
                }
                Ok(n) => {
                    self.buf.append(&self.chunk[..n]);
                    trace!(read = n, buffered = self.buf.available(), "socket read");
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Take the next complete packet out of what is already buffered.
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        self.framer.next_packet(&mut self.buf)
    }

    /// Hand every complete buffered packet to `sink`, in order.
    pub fn drain(&mut self, sink: impl FnMut(Packet)) -> Result<usize> {
        self.framer.drain(&mut self.buf, sink)
    }

    /// Read the next complete packet (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(packet) = self.next_packet()? {
                return Ok(packet);
            }
            self.fill()?;
        }
    }

    /// Number of received bytes not yet framed.
    pub fn buffered(&self) -> usize {
        self.buf.available()
    }

    /// The framer in use.
    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl PacketReader<GameStream> {
    /// Create a packet reader for a `GameStream` and apply a read timeout.
    pub fn with_read_timeout(
        inner: GameStream,
        framer: Framer,
        chunk_size: usize,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        inner
            .set_read_timeout(timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_framer_and_chunk_size(inner, framer, chunk_size))
    }
}

pub(crate) fn transport_to_frame_error(err: gamelink_transport::TransportError) -> FrameError {
    match err {
        gamelink_transport::TransportError::Io(io) => FrameError::Io(io),
        gamelink_transport::TransportError::Resolve { source, .. }
        | gamelink_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{FramerConfig, FramingTable, ProtocolVariant};
    use crate::error::Corruption;

    fn wire(packets: &[(u8, &str)]) -> Vec<u8> {
        let framer = Framer::default();
        let mut wire = BytesMut::new();
        for (type_id, payload) in packets {
            framer.encode(*type_id, payload.as_bytes(), &mut wire).unwrap();
        }
        wire.to_vec()
    }

    #[test]
    fn read_single_packet() {
        let mut reader = PacketReader::new(Cursor::new(wire(&[(1, "hello")])));
        let packet = reader.read_packet().unwrap();

        assert_eq!(packet.type_id(), 1);
        assert_eq!(packet.payload(), b"hello");
    }

    #[test]
    fn read_multiple_packets() {
        let bytes = wire(&[(1, "one"), (2, "two"), (3, "three")]);
        let mut reader = PacketReader::new(Cursor::new(bytes));

        let p1 = reader.read_packet().unwrap();
        let p2 = reader.read_packet().unwrap();
        let p3 = reader.read_packet().unwrap();

        assert_eq!((p1.type_id(), p1.payload()), (1, b"one".as_ref()));
        assert_eq!((p2.type_id(), p2.payload()), (2, b"two".as_ref()));
        assert_eq!((p3.type_id(), p3.payload()), (3, b"three".as_ref()));
    }

    #[test]
    fn fill_then_drain_coalesced_read() {
        let bytes = wire(&[(1, "a"), (2, "b"), (3, "ccc")]);
        let total = bytes.len();
        let mut reader = PacketReader::new(Cursor::new(bytes));

        assert_eq!(reader.fill().unwrap(), total);
        let mut types = Vec::new();
        let count = reader.drain(|p| types.push(p.type_id())).unwrap();

        assert_eq!(count, 3);
        assert_eq!(types, vec![1, 2, 3]);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn small_chunks_split_packets() {
        let bytes = wire(&[(7, "split across reads"), (8, "")]);
        let mut reader =
            PacketReader::with_framer_and_chunk_size(Cursor::new(bytes), Framer::default(), 3);

        let first = reader.read_packet().unwrap();
        let second = reader.read_packet().unwrap();
        assert_eq!(first.payload(), b"split across reads");
        assert_eq!(second.type_id(), 8);
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(&[(4, "slow")]),
            pos: 0,
        };
        let mut reader = PacketReader::new(byte_reader);

        let packet = reader.read_packet().unwrap();
        assert_eq!(packet.type_id(), 4);
        assert_eq!(packet.payload(), b"slow");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = PacketReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_packet_keeps_partial_bytes() {
        let mut partial = wire(&[(2, "only-part-of-it")]);
        partial.truncate(6);

        let mut reader = PacketReader::new(Cursor::new(partial));
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.buffered(), 6);
    }

    #[test]
    fn unknown_type_in_stream() {
        let framer = Framer::new(&FramerConfig {
            variant: ProtocolVariant::Catalogue(FramingTable::empty().with_fixed(0x01, 2)),
            ..FramerConfig::default()
        });
        let mut reader = PacketReader::with_framer(Cursor::new(vec![0x01, 0, 0, 0x42]), framer);

        assert_eq!(reader.read_packet().unwrap().type_id(), 0x01);
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(
            err,
            FrameError::CorruptStream(Corruption::UnknownType(0x42))
        ));
    }

    #[test]
    fn oversized_packet_in_stream() {
        let framer = Framer::new(&FramerConfig {
            max_packet_size: 16,
            ..FramerConfig::default()
        });
        let mut reader = PacketReader::with_framer(Cursor::new(vec![0x01, 0x04, 0x00]), framer);
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::CorruptStream(_)));
    }

    #[test]
    fn read_would_block_propagates_io_error() {
        let reader = WouldBlockThenData {
            state: 0,
            bytes: wire(&[(7, "ok")]),
            pos: 0,
        };
        let mut framed = PacketReader::new(reader);
        let err = framed.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            state: 0,
            bytes: wire(&[(8, "ok")]),
            pos: 0,
        };
        let mut framed = PacketReader::new(reader);
        let packet = framed.read_packet().unwrap();

        assert_eq!(packet.type_id(), 8);
        assert_eq!(packet.payload(), b"ok");
    }

    #[test]
    fn roundtrip_over_tcp() {
        use std::io::Write;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(&wire(&[(0x8F, ""), (0x01, "state")])).unwrap();
        });

        let stream = gamelink_transport::connect(
            &addr.to_string(),
            gamelink_transport::DEFAULT_CONNECT_TIMEOUT,
        )
        .unwrap();
        let mut reader = PacketReader::with_read_timeout(
            stream,
            Framer::default(),
            DEFAULT_READ_CHUNK_SIZE,
            Some(Duration::from_secs(5)),
        )
        .unwrap();

        assert_eq!(reader.read_packet().unwrap().type_id(), 0x8F);
        assert_eq!(reader.read_packet().unwrap().payload(), b"state");
        server.join().unwrap();
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = PacketReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        assert_eq!(reader.framer().max_packet_size(), crate::DEFAULT_MAX_PACKET);
        let _inner = reader.into_inner();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct WouldBlockThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for WouldBlockThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            copy_remaining(&self.bytes, &mut self.pos, buf)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            copy_remaining(&self.bytes, &mut self.pos, buf)
        }
    }

    fn copy_remaining(bytes: &[u8], pos: &mut usize, buf: &mut [u8]) -> std::io::Result<usize> {
        if *pos >= bytes.len() {
            return Ok(0);
        }
        let n = (bytes.len() - *pos).min(buf.len());
        buf[..n].copy_from_slice(&bytes[*pos..*pos + n]);
        *pos += n;
        Ok(n)
    }
}
