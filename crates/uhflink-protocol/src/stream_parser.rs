//! Stream parser for CM protocol frames.
//!
//! TCP has no message boundaries: one read may hold part of a frame, several
//! frames, or noise. [`StreamParser`] keeps the unconsumed remainder returned
//! by [`decode`](crate::decode) and prepends it to the next chunk, queueing
//! every complete frame in stream order.
//!
//! # Usage
//!
//! ```
//! use uhflink_protocol::StreamParser;
//!
//! let mut parser = StreamParser::new();
//!
//! // Heartbeat split across two reads
//! parser.feed(&[0x43, 0x4D, 0x10]);
//! assert!(parser.next_frame().is_none());
//!
//! parser.feed(&[0x00, 0x00, 0x00, 0x00]);
//! let frame = parser.next_frame().unwrap();
//! assert!(frame.is_heartbeat());
//! ```

use bytes::{Buf, BytesMut};
use std::collections::VecDeque;
use uhflink_core::constants::MAX_FRAME_LEN;

use crate::frame::Frame;
use crate::parser::decode;

/// Initial buffer capacity for incoming TCP data.
const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024; // 4 KB

/// Recommended initial capacity for frame queue.
///
/// Readers in inventory mode can burst several tag reports per read.
const INITIAL_FRAME_QUEUE_CAPACITY: usize = 8;

/// Stateful stream parser for CM frames.
///
/// # Example
///
/// ```
/// use uhflink_protocol::{StreamParser, encode};
///
/// let mut parser = StreamParser::new();
///
/// let mut bytes = vec![0xEE, 0xEE]; // noise
/// bytes.extend_from_slice(&encode(0x10, 0, &[]).unwrap());
/// bytes.extend_from_slice(&encode(0x2A, 0, &[1, 0, 0, 0xE2]).unwrap());
/// parser.feed(&bytes);
///
/// assert_eq!(parser.frames_available(), 2);
/// assert_eq!(parser.buffered_len(), 0);
/// ```
#[derive(Debug)]
pub struct StreamParser {
    /// Unconsumed bytes carried over between feeds.
    buffer: BytesMut,

    /// Queue of complete frames ready for extraction.
    frames: VecDeque<Frame>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            frames: VecDeque::with_capacity(INITIAL_FRAME_QUEUE_CAPACITY),
        }
    }

    /// Feed bytes from the TCP stream into the parser.
    ///
    /// Returns the number of frames completed by this chunk.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        self.buffer.extend_from_slice(bytes);

        let decoded = decode(&self.buffer);
        let consumed = decoded.consumed(self.buffer.len());
        let completed = decoded.frames.len();
        self.frames.extend(decoded.frames);
        self.buffer.advance(consumed);

        debug_assert!(self.buffer.len() < MAX_FRAME_LEN);
        completed
    }

    /// Extract next complete frame if available.
    pub fn next_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    /// Returns number of frames ready for extraction.
    pub fn frames_available(&self) -> usize {
        self.frames.len()
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Discard buffered bytes and queued frames.
    ///
    /// [`CmCodec`](crate::CmCodec) calls this at end of stream so a
    /// truncated frame is dropped instead of reported.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.frames.clear();
    }

    /// Returns an iterator that drains all currently available frames.
    ///
    /// This does NOT process more data; call [`feed()`] first.
    ///
    /// [`feed()`]: StreamParser::feed
    pub fn drain_frames(&mut self) -> DrainFrames<'_> {
        DrainFrames { parser: self }
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that drains frames from a [`StreamParser`].
///
/// [`drain_frames()`]: StreamParser::drain_frames
pub struct DrainFrames<'a> {
    parser: &'a mut StreamParser,
}

impl<'a> Iterator for DrainFrames<'a> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.next_frame()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.parser.frames_available();
        (len, Some(len))
    }
}

impl<'a> ExactSizeIterator for DrainFrames<'a> {
    fn len(&self) -> usize {
        self.parser.frames_available()
    }
}
