use bytes::{Bytes, BytesMut};

use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Bytes received from the socket that have not been framed yet.
///
/// Consumed bytes are split off the front of the underlying `BytesMut`, so
/// storage is reclaimed as whole packets are taken out and unparsed bytes
/// always start at index 0 in arrival order.
#[derive(Debug)]
pub struct ByteBuffer {
    buf: BytesMut,
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteBuffer {
    /// Create an empty buffer with the default initial capacity.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_BUFFER_CAPACITY)
    }

    /// Create an empty buffer with an explicit initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append newly received bytes at the tail.
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of unparsed bytes.
    pub fn available(&self) -> usize {
        self.buf.len()
    }

    /// True if no unparsed bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View the next `n` unparsed bytes without consuming them.
    pub fn peek(&self, n: usize) -> Result<&[u8]> {
        self.check(n)?;
        Ok(&self.buf[..n])
    }

    /// Consume the next `n` unparsed bytes and return them.
    pub fn consume(&mut self, n: usize) -> Result<Bytes> {
        self.check(n)?;
        Ok(self.buf.split_to(n).freeze())
    }

    /// Discard every buffered byte.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    fn check(&self, n: usize) -> Result<()> {
        if self.buf.len() < n {
            return Err(FrameError::InsufficientData {
                needed: n,
                available: self.buf.len(),
            });
        }
        Ok(())
    }
}
