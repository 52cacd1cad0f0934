//! Inventory payload decoding.
//!
//! ```text
//! 01  30 00  E2 00 00 11 22 33 44 55 66 77 88 99  F6
//! ^^  ^^^^^  ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^  ^^
//! ant PC     EPC (PC word count * 2 bytes)        RSSI (i8)
//! ```
//!
//! The EPC length comes from the top five bits of the PC word (EPC length
//! in 16-bit words). When that gives zero or more than 32 bytes, the reader
//! is assumed to send a 96-bit EPC, truncated to what the payload holds.

use uhflink_core::{
    TagSighting,
    constants::{DEFAULT_EPC_LEN, EPC_OFFSET, MAX_EPC_LEN, MIN_TAG_PAYLOAD_LEN},
    to_hex_upper,
};

/// Decode one tag sighting from an inventory response payload.
///
/// Returns `None` when the payload is shorter than four bytes, when the EPC
/// would run past the end of the payload, or when no EPC bytes remain.
///
/// # Examples
///
/// ```
/// use uhflink_protocol::extract_tag_read;
///
/// let mut payload = vec![0x01, 0x30, 0x00];
/// payload.extend_from_slice(&[0xE2, 0x00, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99]);
/// payload.push(0xF6);
///
/// let tag = extract_tag_read(&payload).unwrap();
/// assert_eq!(tag.antenna, 1);
/// assert_eq!(tag.epc, "E20000112233445566778899");
/// assert_eq!(tag.rssi, -10);
/// ```
pub fn extract_tag_read(payload: &[u8]) -> Option<TagSighting> {
    if payload.len() < MIN_TAG_PAYLOAD_LEN {
        return None;
    }

    let antenna = payload[0];
    let pc = u16::from_be_bytes([payload[1], payload[2]]);

    let mut epc_len = usize::from((pc >> 11) & 0x1F) * 2;
    if epc_len == 0 || epc_len > MAX_EPC_LEN {
        epc_len = DEFAULT_EPC_LEN.min(payload.len() - MIN_TAG_PAYLOAD_LEN);
    }
    if epc_len == 0 {
        return None;
    }

    let epc = payload.get(EPC_OFFSET..EPC_OFFSET + epc_len)?;
    let rssi = payload
        .get(EPC_OFFSET + epc_len)
        .map(|&b| b as i8)
        .unwrap_or(0);

    Some(TagSighting {
        epc: to_hex_upper(epc),
        antenna,
        pc,
        rssi,
    })
}
