//! CM frame protocol spoken by the UHF reader family.
//!
//! Pure encode/decode logic with no I/O:
//!
//! - [`Frame`] and [`encode`]: wire representation of one command or response
//! - [`decode`]: resynchronising scanner that splits a byte buffer into frames
//!   and an unconsumed remainder
//! - [`StreamParser`]: incremental wrapper that carries the remainder between reads
//! - [`CmCodec`]: `tokio_util` codec for use with `Framed`
//! - [`extract_tag_read`]: inventory payload → tag sighting

pub mod codec;
pub mod commands;
pub mod frame;
pub mod parser;
pub mod stream_parser;
pub mod tag;

pub use codec::CmCodec;
pub use commands::{CommandCode, is_inventory_response};
pub use frame::{Frame, encode};
pub use parser::{Decoded, decode};
pub use stream_parser::{DrainFrames, StreamParser};
pub use tag::extract_tag_read;
