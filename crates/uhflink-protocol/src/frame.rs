use crate::commands::{CommandCode, is_inventory_response};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use uhflink_core::{
    Error, Result,
    constants::{DEFAULT_READER_ID, FRAME_HEADER_LEN, FRAME_MARKER, FRAME_PADDING, MAX_PAYLOAD_LEN},
};

/// One CM protocol frame.
///
/// A frame is the unit exchanged with the reader: a command code, the reader
/// id and a self-describing payload of up to 255 bytes.
///
/// # Wire Format
///
/// ```text
/// 43 4D  2A  00  0F  01 00 00 E2 00 ... C8  00 00
/// ^^^^^  ^^  ^^  ^^  ^^^^^^^^^^^^^^^^^^^^^  ^^^^^
/// "CM"   cmd id  len payload (len bytes)    padding
/// ```
///
/// The padding bytes are written by [`Frame::encode`] but are not counted
/// in the length byte and are never validated on decode.
///
/// # Basic Usage
/// ```
/// use uhflink_protocol::{CommandCode, Frame};
///
/// let frame = Frame::request(CommandCode::Heartbeat);
/// assert_eq!(
///     frame.encode().as_ref(),
///     &[0x43, 0x4D, 0x10, 0x00, 0x00, 0x00, 0x00]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    command: u8,
    reader_id: u8,
    payload: Bytes,
}

impl Frame {
    /// Create a frame, validating the payload length.
    ///
    /// # Errors
    /// Returns `Error::PayloadTooLarge` if the payload exceeds 255 bytes.
    pub fn new(command: u8, reader_id: u8, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max_size: MAX_PAYLOAD_LEN,
            });
        }
        Ok(Self {
            command,
            reader_id,
            payload,
        })
    }

    /// Empty-payload request for the default reader.
    pub fn request(command: CommandCode) -> Self {
        Self {
            command: command.as_u8(),
            reader_id: DEFAULT_READER_ID,
            payload: Bytes::new(),
        }
    }

    /// Build from parts already known to be in range (used by the decoder).
    pub(crate) fn from_parts(command: u8, reader_id: u8, payload: &[u8]) -> Self {
        Self {
            command,
            reader_id,
            payload: Bytes::copy_from_slice(payload),
        }
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    /// The command as a known code, if it is one.
    pub fn command_code(&self) -> Option<CommandCode> {
        CommandCode::from_u8(self.command)
    }

    pub fn reader_id(&self) -> u8 {
        self.reader_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn is_heartbeat(&self) -> bool {
        self.command == CommandCode::Heartbeat.as_u8()
    }

    /// Inventory response carrying tag data: accepted code and non-empty payload.
    pub fn is_inventory_response(&self) -> bool {
        is_inventory_response(self.command) && !self.payload.is_empty()
    }

    /// Size of this frame on the wire, padding included.
    pub fn encoded_len(&self) -> usize {
        FRAME_HEADER_LEN + self.payload.len() + FRAME_PADDING.len()
    }

    /// Append the wire representation to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.reserve(self.encoded_len());
        dst.put_slice(&FRAME_MARKER);
        dst.put_u8(self.command);
        dst.put_u8(self.reader_id);
        // Length fits: enforced by the constructors.
        dst.put_u8(self.payload.len() as u8);
        dst.put_slice(&self.payload);
        dst.put_slice(&FRAME_PADDING);
    }

    /// Wire representation of this frame.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.command_code() {
            Some(code) => write!(f, "{}", code.name())?,
            None => write!(f, "0x{:02X}", self.command)?,
        }
        write!(f, " id={} len={}", self.reader_id, self.payload.len())
    }
}

/// Encode a frame from its parts.
///
/// Produces `[0x43, 0x4D, command, reader_id, len(data), ...data, 0x00, 0x00]`.
///
/// # Errors
/// Returns `Error::PayloadTooLarge` if `data` exceeds 255 bytes.
///
/// # Examples
///
/// ```
/// let bytes = uhflink_protocol::encode(0x2A, 0x00, &[0x01, 0x02]).unwrap();
/// assert_eq!(bytes.as_ref(), &[0x43, 0x4D, 0x2A, 0x00, 0x02, 0x01, 0x02, 0x00, 0x00]);
/// ```
pub fn encode(command: u8, reader_id: u8, data: &[u8]) -> Result<Bytes> {
    Frame::new(command, reader_id, Bytes::copy_from_slice(data)).map(|frame| frame.encode())
}
