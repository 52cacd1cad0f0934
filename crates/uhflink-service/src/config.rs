//! Persisted reader configuration.
//!
//! Stored as JSON. Every field is optional in the file; missing fields take
//! the defaults below, so a file holding only `{"ip": "192.168.1.155"}` is
//! valid.
//!
//! ```json
//! {
//!   "ip": "192.168.1.155",
//!   "port": 20058,
//!   "reconnect_delay_ms": 500,
//!   "heartbeat_interval_ms": 3000,
//!   "priority_ports": [20058, 4001, 6000, 8160]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use uhflink_core::{
    Error, ReaderAddress,
    constants::{
        DEEP_SCAN_PORTS, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HEALTH_CHECK_INTERVAL_MS,
        DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PROBE_TIMEOUT_MS,
        DEFAULT_READER_PORT, DEFAULT_RECONNECT_DELAY_MS, DEFAULT_SCAN_BATCH_SIZE,
        DEFAULT_SETTLE_DELAY_MS, DEFAULT_STALE_TIMEOUT_MS, DEFAULT_VERIFY_TIMEOUT_MS,
        DEFAULT_WRITE_TIMEOUT_MS, PRIORITY_PORTS,
    },
};
use uhflink_network::{ConnectionConfig, ScanConfig};

use crate::error::ServiceResult;

/// Reader address and connection/scan tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Last known reader IP; also the scanner's fast path.
    pub ip: Option<IpAddr>,
    pub port: u16,

    pub reconnect_delay_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub poll_interval_ms: u64,
    pub health_check_interval_ms: u64,
    pub stale_timeout_ms: u64,
    pub settle_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub write_timeout_ms: u64,

    pub verify_timeout_ms: u64,
    pub probe_timeout_ms: u64,
    pub scan_batch_size: usize,
    pub priority_ports: Vec<u16>,
    pub deep_ports: Vec<u16>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            ip: None,
            port: DEFAULT_READER_PORT,
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            health_check_interval_ms: DEFAULT_HEALTH_CHECK_INTERVAL_MS,
            stale_timeout_ms: DEFAULT_STALE_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            verify_timeout_ms: DEFAULT_VERIFY_TIMEOUT_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
            priority_ports: PRIORITY_PORTS.to_vec(),
            deep_ports: DEEP_SCAN_PORTS.to_vec(),
        }
    }
}

impl ReaderConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> ServiceResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        debug!(path = %path.display(), "loaded reader config");
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> ServiceResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate JSON.
    pub fn from_json(json: &str) -> ServiceResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> ServiceResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "saved reader config");
        Ok(())
    }

    /// # Errors
    /// Returns `Error::InvalidPort` for a zero port anywhere and
    /// `Error::Config` for zero intervals, a zero batch size or an empty
    /// priority port list.
    pub fn validate(&self) -> uhflink_core::Result<()> {
        let mut ports = std::iter::once(&self.port)
            .chain(&self.priority_ports)
            .chain(&self.deep_ports);
        if ports.any(|&port| port == 0) {
            return Err(Error::InvalidPort(0));
        }
        if self.priority_ports.is_empty() {
            return Err(Error::Config("priority_ports must not be empty".into()));
        }
        if self.scan_batch_size == 0 {
            return Err(Error::Config("scan_batch_size must be greater than zero".into()));
        }
        for (name, value) in [
            ("verify_timeout_ms", self.verify_timeout_ms),
            ("probe_timeout_ms", self.probe_timeout_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be greater than zero")));
            }
        }
        self.connection_config().validate()
    }

    /// Saved reader address, if an IP is configured.
    pub fn address(&self) -> Option<ReaderAddress> {
        self.ip.and_then(|ip| ReaderAddress::new(ip, self.port).ok())
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            health_check_interval: Duration::from_millis(self.health_check_interval_ms),
            stale_timeout: Duration::from_millis(self.stale_timeout_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
        }
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            priority_ports: self.priority_ports.clone(),
            deep_ports: self.deep_ports.clone(),
            verify_timeout: Duration::from_millis(self.verify_timeout_ms),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            batch_size: self.scan_batch_size,
        }
    }
}
