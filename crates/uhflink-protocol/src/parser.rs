//! Resynchronising frame scanner.
//!
//! [`decode`] walks a byte buffer left to right looking for the `CM` marker.
//! Bytes that do not start a marker are skipped one at a time, so garbage,
//! padding and the tail of a frame whose start was lost never stall the
//! stream. A frame is only ever parsed from an offset where the marker was
//! seen.
//!
//! ```text
//! .. 7F 00 | 43 4D 10 00 00 | 00 00 | 43 4D 2A 00 0F 01 ..
//! garbage  | frame          | pad   | partial frame → remainder
//! ```

use crate::frame::Frame;
use uhflink_core::constants::{FRAME_HEADER_LEN, FRAME_MARKER};

/// Result of scanning one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<'a> {
    /// Complete frames in stream order.
    pub frames: Vec<Frame>,

    /// Unconsumed tail: a partial frame (or a lone first marker byte) that
    /// must be prepended to the next bytes received.
    pub remainder: &'a [u8],
}

impl Decoded<'_> {
    /// Number of leading bytes of the input that were consumed.
    pub fn consumed(&self, input_len: usize) -> usize {
        input_len - self.remainder.len()
    }
}

/// Split `buffer` into complete frames and an unconsumed remainder.
///
/// # Examples
///
/// ```
/// use uhflink_protocol::decode;
///
/// let buf = [0xFF, 0x43, 0x4D, 0x10, 0x00, 0x00, 0x00, 0x00, 0x43, 0x4D, 0x2A];
/// let decoded = decode(&buf);
///
/// assert_eq!(decoded.frames.len(), 1);
/// assert_eq!(decoded.frames[0].command(), 0x10);
/// assert_eq!(decoded.remainder, &[0x43, 0x4D, 0x2A]);
/// ```
pub fn decode(buffer: &[u8]) -> Decoded<'_> {
    let mut frames = Vec::new();
    let mut offset = 0;

    while offset < buffer.len() {
        let rest = &buffer[offset..];

        if !rest.starts_with(&FRAME_MARKER) {
            // A trailing first marker byte may be completed by the next read.
            if rest.len() == 1 && rest[0] == FRAME_MARKER[0] {
                break;
            }
            offset += 1;
            continue;
        }

        if rest.len() < FRAME_HEADER_LEN {
            break;
        }

        let data_len = rest[4] as usize;
        let frame_len = FRAME_HEADER_LEN + data_len;
        if rest.len() < frame_len {
            break;
        }

        frames.push(Frame::from_parts(
            rest[2],
            rest[3],
            &rest[FRAME_HEADER_LEN..frame_len],
        ));
        offset += frame_len;
    }

    Decoded {
        frames,
        remainder: &buffer[offset..],
    }
}
