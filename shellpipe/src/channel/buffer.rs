//! Accumulation buffer for output read from the child but not yet delivered.
//!
//! Bytes are appended as they are read and a prefix is removed each time a
//! terminator is consumed. Whatever follows the terminator stays put for the
//! next read call, so a terminator split across two physical reads is still
//! found.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use vte::{Parser, Perform};

/// Buffer of undelivered child output.
pub struct AccumulationBuffer {
    /// Bytes read but not yet delivered.
    buffer: BytesMut,

    /// Escape parser, present when ANSI stripping is enabled. It lives as
    /// long as the buffer so sequences and UTF-8 characters split across
    /// reads are reassembled.
    ansi: Option<Parser>,
}

/// Keeps printable text and the `\n`, `\r`, `\t` controls.
struct ControlStripper<'a>(&'a mut BytesMut);

impl Perform for ControlStripper<'_> {
    fn print(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.0.put_u8(byte);
        }
    }
}

impl AccumulationBuffer {
    /// Create an empty buffer.
    pub fn new(strip_ansi: bool) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            ansi: strip_ansi.then(Parser::new),
        }
    }

    /// Whether escape sequences are stripped on append.
    pub fn strips_ansi(&self) -> bool {
        self.ansi.is_some()
    }

    /// Append newly read data.
    pub fn extend(&mut self, data: &[u8]) {
        match &mut self.ansi {
            Some(parser) => parser.advance(&mut ControlStripper(&mut self.buffer), data),
            None => self.buffer.extend_from_slice(data),
        }
    }

    /// Remove and return the first `end` bytes.
    ///
    /// `end` is clamped to the buffer length.
    pub fn consume(&mut self, end: usize) -> Bytes {
        let end = end.min(self.buffer.len());
        self.buffer.split_to(end).freeze()
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.consume(self.buffer.len()).to_vec()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop the contents and any half-parsed escape sequence.
    pub fn clear(&mut self) {
        self.buffer.clear();
        if self.ansi.is_some() {
            self.ansi = Some(Parser::new());
        }
    }
}

impl fmt::Debug for AccumulationBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccumulationBuffer")
            .field("len", &self.buffer.len())
            .field("strip_ansi", &self.ansi.is_some())
            .finish()
    }
}

impl Default for AccumulationBuffer {
    fn default() -> Self {
        Self::new(false)
    }
}
