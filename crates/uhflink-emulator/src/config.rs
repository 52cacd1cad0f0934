use std::net::SocketAddr;
use std::time::Duration;
use uhflink_core::{
    Error, Result,
    constants::{DEFAULT_READER_PORT, MAX_EPC_LEN},
};

/// A tag the emulated reader reports on every inventory round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatedTag {
    epc: Vec<u8>,
    pub antenna: u8,
    pub rssi: i8,
}

impl EmulatedTag {
    /// # Errors
    /// Returns `Error::Config` for an empty, odd-length, oversize or
    /// non-word-aligned EPC.
    pub fn new(epc: Vec<u8>, antenna: u8, rssi: i8) -> Result<Self> {
        if epc.is_empty() || epc.len() > MAX_EPC_LEN || epc.len() % 2 != 0 {
            return Err(Error::Config(format!(
                "EPC must be 2..={MAX_EPC_LEN} bytes in whole 16-bit words, got {}",
                epc.len()
            )));
        }
        Ok(Self { epc, antenna, rssi })
    }

    /// Parse an EPC written as hex, e.g. `"E20000112233445566778899"`.
    ///
    /// # Errors
    /// Returns `Error::Config` for non-hex input or an invalid length.
    pub fn from_hex(epc: &str, antenna: u8, rssi: i8) -> Result<Self> {
        let epc = epc.trim();
        if !epc.is_ascii() || epc.len() % 2 != 0 {
            return Err(Error::Config(format!("invalid EPC hex: {epc}")));
        }
        let bytes = (0..epc.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&epc[i..i + 2], 16))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(|_| Error::Config(format!("invalid EPC hex: {epc}")))?;
        Self::new(bytes, antenna, rssi)
    }

    /// PC word announcing the EPC length in words.
    pub fn pc(&self) -> u16 {
        ((self.epc.len() / 2) as u16) << 11
    }

    /// Inventory response payload: antenna, PC, EPC, RSSI.
    pub fn payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.epc.len() + 4);
        payload.push(self.antenna);
        payload.extend_from_slice(&self.pc().to_be_bytes());
        payload.extend_from_slice(&self.epc);
        payload.push(self.rssi as u8);
        payload
    }
}

/// Emulated reader settings.
#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    pub bind_addr: SocketAddr,

    /// Tags in the field.
    pub tags: Vec<EmulatedTag>,

    /// Payload of `GET_VERSION` responses.
    pub firmware_version: String,

    /// Period of reader-initiated heartbeats.
    pub heartbeat_interval: Duration,

    /// Period of tag reports while auto-read is on.
    pub report_interval: Duration,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_READER_PORT)),
            tags: Vec::new(),
            firmware_version: format!("UHFLINK-EMU {}", uhflink_core::VERSION),
            heartbeat_interval: Duration::from_secs(10),
            report_interval: Duration::from_secs(1),
        }
    }
}
