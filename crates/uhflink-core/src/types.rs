use crate::{Result, constants::DEFAULT_READER_PORT, error::Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Network endpoint of a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReaderAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl ReaderAddress {
    /// Create an address from an already parsed IP.
    ///
    /// # Errors
    /// Returns `Error::InvalidPort` for port 0.
    pub fn new(ip: IpAddr, port: u16) -> Result<Self> {
        if port == 0 {
            return Err(Error::InvalidPort(port));
        }
        Ok(Self { ip, port })
    }

    /// Parse a textual IP and pair it with a port.
    ///
    /// # Errors
    /// Returns `Error::InvalidAddress` if `ip` is not an IPv4/IPv6 literal,
    /// `Error::InvalidPort` for port 0.
    pub fn parse(ip: &str, port: u16) -> Result<Self> {
        let ip: IpAddr = ip
            .trim()
            .parse()
            .map_err(|_| Error::InvalidAddress(ip.to_string()))?;
        Self::new(ip, port)
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for ReaderAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

impl From<SocketAddr> for ReaderAddress {
    fn from(addr: SocketAddr) -> Self {
        Self {
            ip: addr.ip(),
            port: addr.port(),
        }
    }
}

impl std::str::FromStr for ReaderAddress {
    type Err = Error;

    /// Accepts `ip:port` or a bare IP (default reader port).
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(addr) = s.trim().parse::<SocketAddr>() {
            return Self::new(addr.ip(), addr.port());
        }
        Self::parse(s, DEFAULT_READER_PORT)
    }
}

/// Connection lifecycle of a reader link.
///
/// `Reconnecting` is the disconnected state while a reconnect timer is
/// armed; `Disconnected` is idle with nothing scheduled.
///
/// # Valid Transitions
///
/// - Disconnected → Connecting
/// - Connecting → Connected / Reconnecting / Disconnected
/// - Connected → Reconnecting / Disconnected
/// - Reconnecting → Connecting / Disconnected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    /// Check if transition to `target` is allowed from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use uhflink_core::ConnectionState;
    ///
    /// assert!(ConnectionState::Disconnected.can_transition_to(ConnectionState::Connecting));
    /// assert!(!ConnectionState::Disconnected.can_transition_to(ConnectionState::Connected));
    /// ```
    pub fn can_transition_to(&self, target: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected | Reconnecting | Disconnected)
                | (Connected, Reconnecting | Disconnected)
                | (Reconnecting, Connecting | Disconnected)
        )
    }

    /// `true` only for [`ConnectionState::Connected`].
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Reconnecting => "Reconnecting",
        };
        write!(f, "{s}")
    }
}

/// Snapshot of a connection manager, as reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub ip: Option<IpAddr>,
    pub port: Option<u16>,
    pub inventory_active: bool,
    pub state: ConnectionState,
    /// Firmware string reported by the reader for the current connection.
    pub firmware_version: Option<String>,
}

impl ConnectionStatus {
    pub fn address(&self) -> Option<ReaderAddress> {
        match (self.ip, self.port) {
            (Some(ip), Some(port)) => Some(ReaderAddress { ip, port }),
            _ => None,
        }
    }
}

/// One decoded tag observation, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagSighting {
    /// EPC as uppercase hex.
    pub epc: String,
    pub antenna: u8,
    pub pc: u16,
    pub rssi: i8,
}

/// Deduplicated tag record kept for the current inventory session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRead {
    pub epc: String,
    pub antenna: u8,
    pub pc: u16,
    pub rssi: i8,
    pub count: u32,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl TagRead {
    /// Start a record from its first sighting.
    pub fn first(sighting: TagSighting, at: DateTime<Utc>) -> Self {
        Self {
            epc: sighting.epc,
            antenna: sighting.antenna,
            pc: sighting.pc,
            rssi: sighting.rssi,
            count: 1,
            first_seen_at: at,
            last_seen_at: at,
        }
    }
}

/// Format bytes as contiguous uppercase hex.
///
/// ```
/// assert_eq!(uhflink_core::to_hex_upper(&[0xE2, 0x00, 0x0a]), "E2000A");
/// ```
pub fn to_hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}
