use std::io::{ErrorKind, Write};
use std::time::Duration;

use bytes::BytesMut;
use gamelink_transport::GameStream;

use crate::codec::Framer;
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes outbound bytes to any `Write` stream.
///
/// Callers normally hand over bytes that are already framed; the writer
/// only guarantees they reach the stream whole. [`PacketWriter::send_packet`]
/// frames a payload first.
pub struct PacketWriter<T> {
    inner: T,
    buf: BytesMut,
    framer: Framer,
}

impl<T: Write> PacketWriter<T> {
    /// Create a new writer with the default framer.
    pub fn new(inner: T) -> Self {
        Self::with_framer(inner, Framer::default())
    }

    /// Create a new writer with an explicit framer.
    pub fn with_framer(inner: T, framer: Framer) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            framer,
        }
    }

    /// Write all of `bytes` and flush (blocking). Returns the byte count.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<usize> {
        write_all(&mut self.inner, bytes)?;
        self.flush()?;
        Ok(bytes.len())
    }

    /// Frame `payload` as a packet of `type_id` and write it.
    pub fn send_packet(&mut self, type_id: u8, payload: &[u8]) -> Result<usize> {
        self.buf.clear();
        self.framer.encode(type_id, payload, &mut self.buf)?;

        write_all(&mut self.inner, &self.buf)?;
        self.flush()?;
        Ok(self.buf.len())
    }

    /// Flush the underlying stream.
    ///
    /// Only `Interrupted` is retried. Streams are blocking, so `WouldBlock`
    /// means the write timeout expired and is returned as an I/O error.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// The framer used by [`PacketWriter::send_packet`].
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl PacketWriter<GameStream> {
    /// Create a writer for a `GameStream` and apply a write timeout.
    pub fn with_write_timeout(
        inner: GameStream,
        framer: Framer,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        inner
            .set_write_timeout(timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_framer(inner, framer))
    }
}

fn write_all<T: Write>(inner: &mut T, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match inner.write(&bytes[offset..]) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::buffer::ByteBuffer;
    use crate::codec::{FramerConfig, FramingTable, ProtocolVariant};

    fn decode_all(bytes: &[u8]) -> Vec<(u8, Vec<u8>)> {
        let mut buf = ByteBuffer::new();
        buf.append(bytes);
        let mut out = Vec::new();
        Framer::default()
            .drain(&mut buf, |p| out.push((p.type_id(), p.payload().to_vec())))
            .unwrap();
        out
    }

    #[test]
    fn write_raw_passes_bytes_through() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));

        let written = writer
            .write_raw(&[0x01, 0x00, 0x04, 0xAA, 0xBB, 0xCC, 0xDD])
            .unwrap();
        assert_eq!(written, 7);

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, vec![0x01, 0x00, 0x04, 0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn send_packet_frames_payload() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));

        assert_eq!(writer.send_packet(1, b"one").unwrap(), 6);
        writer.send_packet(2, b"").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(
            decode_all(&wire),
            vec![(1, b"one".to_vec()), (2, Vec::new())]
        );
    }

    #[test]
    fn send_packet_unknown_type_writes_nothing() {
        let framer = Framer::new(&FramerConfig {
            variant: ProtocolVariant::Catalogue(FramingTable::empty()),
            ..FramerConfig::default()
        });
        let mut writer = PacketWriter::with_framer(Cursor::new(Vec::<u8>::new()), framer);

        let err = writer.send_packet(3, b"x").unwrap_err();
        assert!(matches!(err, FrameError::UnsupportedType(3)));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = PacketWriter::new(sink);

        writer.write_raw(b"x").unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = InterruptedWriteThenFlush {
            wrote_once: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = PacketWriter::new(writer_impl);
        writer.write_raw(b"retry").unwrap();

        assert_eq!(writer.into_inner().data, b"retry");
    }

    #[test]
    fn short_writes_are_completed() {
        let mut writer = PacketWriter::new(TwoBytesAtATime { data: Vec::new() });
        writer.write_raw(b"several bytes").unwrap();
        assert_eq!(writer.into_inner().data, b"several bytes");
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = PacketWriter::new(ZeroWriter);
        let err = writer.write_raw(b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn broken_pipe_is_io_error() {
        let mut writer = PacketWriter::new(BrokenWriter);
        let err = writer.write_raw(b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn expired_write_timeout_is_io_error() {
        let mut writer = PacketWriter::new(StalledWriter {
            kind: ErrorKind::WouldBlock,
            calls: 0,
        });
        let err = writer.write_raw(b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::WouldBlock));
        assert_eq!(writer.get_ref().calls, 1);

        let mut writer = PacketWriter::new(StalledWriter {
            kind: ErrorKind::TimedOut,
            calls: 0,
        });
        let err = writer.send_packet(1, b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::TimedOut));
    }

    #[test]
    fn stalled_flush_is_io_error() {
        let mut writer = PacketWriter::new(StalledFlush);
        let err = writer.flush().unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = PacketWriter::new(Cursor::new(Vec::<u8>::new()));

        let _ = writer.get_ref();
        let _ = writer.get_mut();
        let _ = writer.framer();
        let _inner = writer.into_inner();
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedWriteThenFlush {
        wrote_once: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedWriteThenFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct TwoBytesAtATime {
        data: Vec<u8>,
    }

    impl Write for TwoBytesAtATime {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(2);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct StalledWriter {
        kind: ErrorKind,
        calls: usize,
    }

    impl Write for StalledWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            self.calls += 1;
            Err(std::io::Error::from(self.kind))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct StalledFlush;

    impl Write for StalledFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
