//! Command code definitions for the CM protocol.
//!
//! Each frame carries a one-byte command code at offset 2. Requests sent by
//! the host and responses sent by the reader share the same code space: a
//! response to `START_INVENTORY` carries `0x2A` and the tag data.
//!
//! # Command Categories
//!
//! ## Link Maintenance
//! - `Heartbeat` (0x10): keep-alive, sent by either side and echoed
//!
//! ## Inventory
//! - `StartInventory` (0x2A): request one scan burst
//! - `StopInventory` (0x2B): stop scanning
//! - `StartAutoRead` (0x2E): enter continuous read mode
//! - `StopAutoRead` (0x2F): leave continuous read mode
//! - `Vendor22`, `Vendor29`, `Vendor81`: inventory responses emitted by some
//!   firmware revisions
//!
//! ## Device Information
//! - `GetVersion` (0x31): firmware version query
//! - `DeviceInfoReport` (0x67): unsolicited device report
//!
//! # Examples
//!
//! ```
//! use uhflink_protocol::CommandCode;
//!
//! let cmd = CommandCode::from_u8(0x2E).unwrap();
//! assert_eq!(cmd, CommandCode::StartAutoRead);
//! assert_eq!(cmd.as_u8(), 0x2E);
//! assert!(cmd.is_inventory_response());
//!
//! assert!(CommandCode::from_u8(0xFF).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uhflink_core::Error;

/// Known CM command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandCode {
    /// Keep-alive (0x10).
    Heartbeat = 0x10,

    /// Vendor inventory response (0x22).
    Vendor22 = 0x22,

    /// Vendor inventory response (0x29).
    Vendor29 = 0x29,

    /// Start one inventory burst (0x2A).
    StartInventory = 0x2A,

    /// Stop inventory (0x2B).
    StopInventory = 0x2B,

    /// Start continuous auto-read (0x2E).
    StartAutoRead = 0x2E,

    /// Stop continuous auto-read (0x2F).
    StopAutoRead = 0x2F,

    /// Firmware version query (0x31).
    GetVersion = 0x31,

    /// Unsolicited device information report (0x67).
    DeviceInfoReport = 0x67,

    /// Vendor inventory response (0x81).
    Vendor81 = 0x81,
}

/// Codes whose non-empty responses carry a tag payload.
const INVENTORY_RESPONSE_CODES: [CommandCode; 5] = [
    CommandCode::StartInventory,
    CommandCode::StartAutoRead,
    CommandCode::Vendor22,
    CommandCode::Vendor81,
    CommandCode::Vendor29,
];

impl CommandCode {
    /// Map a raw byte to a known command code.
    pub fn from_u8(code: u8) -> Option<Self> {
        let cmd = match code {
            0x10 => Self::Heartbeat,
            0x22 => Self::Vendor22,
            0x29 => Self::Vendor29,
            0x2A => Self::StartInventory,
            0x2B => Self::StopInventory,
            0x2E => Self::StartAutoRead,
            0x2F => Self::StopAutoRead,
            0x31 => Self::GetVersion,
            0x67 => Self::DeviceInfoReport,
            0x81 => Self::Vendor81,
            _ => return None,
        };
        Some(cmd)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether responses with this code are inventory (tag) reports.
    pub fn is_inventory_response(self) -> bool {
        INVENTORY_RESPONSE_CODES.contains(&self)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Heartbeat => "HEARTBEAT",
            Self::Vendor22 => "VENDOR_22",
            Self::Vendor29 => "VENDOR_29",
            Self::StartInventory => "START_INVENTORY",
            Self::StopInventory => "STOP_INVENTORY",
            Self::StartAutoRead => "START_AUTO_READ",
            Self::StopAutoRead => "STOP_AUTO_READ",
            Self::GetVersion => "GET_VERSION",
            Self::DeviceInfoReport => "DEVICE_INFO_REPORT",
            Self::Vendor81 => "VENDOR_81",
        }
    }
}

/// Whether a raw command byte belongs to the inventory response set.
pub fn is_inventory_response(code: u8) -> bool {
    CommandCode::from_u8(code).is_some_and(CommandCode::is_inventory_response)
}

impl From<CommandCode> for u8 {
    fn from(code: CommandCode) -> u8 {
        code.as_u8()
    }
}

impl TryFrom<u8> for CommandCode {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_u8(code).ok_or(Error::InvalidCommandCode(code))
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.as_u8())
    }
}
