//! Events published to the host application and scan bookkeeping types.
//!
//! Events serialise with a kebab-case `event` tag so a host can forward them
//! verbatim over whatever transport reaches its UI:
//!
//! ```
//! use uhflink_core::{ReaderEvent, TagSighting};
//!
//! let event = ReaderEvent::TagRead(TagSighting {
//!     epc: "E200".into(),
//!     antenna: 1,
//!     pc: 0x3000,
//!     rssi: -10,
//! });
//! let json = serde_json::to_string(&event).unwrap();
//! assert!(json.contains("\"event\":\"tag-read\""));
//! ```

use crate::types::{ConnectionStatus, ReaderAddress, TagSighting};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Event emitted by the reader subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ReaderEvent {
    StatusChanged(ConnectionStatus),
    TagRead(TagSighting),
    ScanProgress(ScanProgress),
}

/// Phase reported by a running network scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Scanning,
    Trying,
    Verifying,
    Found,
    NotFound,
}

/// Incremental scan progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProgress {
    pub status: ScanStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ScanProgress {
    pub fn new(status: ScanStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            ip: None,
            port: None,
        }
    }

    pub fn at(mut self, addr: ReaderAddress) -> Self {
        self.ip = Some(addr.ip);
        self.port = Some(addr.port);
        self
    }
}

/// Why a scan candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No response within the handshake timeout.
    Timeout,
    /// The endpoint answered without the CM marker.
    InvalidProtocol,
    /// The endpoint closed the socket before answering.
    ConnectionClosed,
    /// Socket-level failure (refused, unreachable, ...).
    Socket(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::InvalidProtocol => write!(f, "invalid_protocol"),
            Self::ConnectionClosed => write!(f, "connection_closed"),
            Self::Socket(message) => write!(f, "{message}"),
        }
    }
}

/// An endpoint considered during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCandidate {
    pub addr: ReaderAddress,
    pub verified: bool,
    pub reason: Option<RejectReason>,
}

impl ScanCandidate {
    pub fn verified(addr: ReaderAddress) -> Self {
        Self {
            addr,
            verified: true,
            reason: None,
        }
    }

    pub fn rejected(addr: ReaderAddress, reason: RejectReason) -> Self {
        Self {
            addr,
            verified: false,
            reason: Some(reason),
        }
    }
}

/// Final result of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Found { address: ReaderAddress },
    NotFound,
}

impl ScanOutcome {
    pub fn address(&self) -> Option<ReaderAddress> {
        match self {
            Self::Found { address } => Some(*address),
            Self::NotFound => None,
        }
    }
}
