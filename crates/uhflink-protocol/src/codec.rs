//! Tokio codec for CM protocol framing.
//!
//! [`CmCodec`] wraps the [`StreamParser`] to provide a thin integration layer
//! with Tokio's codec traits:
//! - [`Decoder`]: extracts complete frames from a TCP byte stream,
//!   resynchronising past garbage
//! - [`Encoder<Frame>`]: writes frames in wire format, padding included
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use uhflink_protocol::{CmCodec, CommandCode, Frame};
//!
//! # async fn example() -> uhflink_core::Result<()> {
//! let stream = TcpStream::connect("192.168.1.155:20058").await?;
//! let mut framed = Framed::new(stream, CmCodec::new());
//!
//! framed.send(Frame::request(CommandCode::GetVersion)).await?;
//!
//! if let Some(Ok(response)) = framed.next().await {
//!     println!("Received: {response}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Decoding never fails: malformed input is skipped by resynchronisation and
//! a partial frame simply waits for more bytes.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use uhflink_core::{Error, Result};

use crate::{Frame, StreamParser};

/// Tokio codec for CM frames.
#[derive(Debug, Default)]
pub struct CmCodec {
    parser: StreamParser,
}

impl CmCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn buffered_len(&self) -> usize {
        self.parser.buffered_len()
    }
}

impl Decoder for CmCodec {
    type Item = Frame;
    type Error = Error;

    /// Decode a frame from the byte stream.
    ///
    /// All of `src` is moved into the internal parser; incomplete tails are
    /// kept there until the next call.
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use tokio_util::codec::Decoder;
    /// use uhflink_protocol::CmCodec;
    ///
    /// let mut codec = CmCodec::new();
    /// let mut buffer = BytesMut::from(&[0x43, 0x4D, 0x10, 0x00, 0x00, 0x00, 0x00][..]);
    ///
    /// let frame = codec.decode(&mut buffer).unwrap().unwrap();
    /// assert!(frame.is_heartbeat());
    /// ```
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if !src.is_empty() {
            self.parser.feed(src);
            src.clear();
        }

        Ok(self.parser.next_frame())
    }

    /// Drain remaining frames at end of stream; a trailing partial frame is
    /// discarded.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                self.parser.clear();
                Ok(None)
            }
        }
    }
}

impl Encoder<Frame> for CmCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        item.encode_into(dst);
        Ok(())
    }
}
