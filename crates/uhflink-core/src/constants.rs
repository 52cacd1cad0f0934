//! Core constants for the CM reader protocol and connection policies.
//!
//! This module defines the wire-level constants of the CM frame format and
//! the default timings used by the connection manager and network scanner.
//! Everything that can be tuned at runtime has a matching field in the
//! service configuration; the values here are the defaults.
//!
//! # Frame Structure
//!
//! ```text
//! byte 0-1      : 0x43 0x4D   ("CM" marker)
//! byte 2        : command code
//! byte 3        : reader id
//! byte 4        : data length N
//! byte 5..4+N   : payload
//! byte 5+N, 6+N : 0x00 0x00   (padding)
//! ```
//!
//! # Usage
//!
//! ```
//! use uhflink_core::constants::*;
//!
//! assert_eq!(FRAME_MARKER, [0x43, 0x4D]);
//! assert_eq!(FRAME_HEADER_LEN + MAX_PAYLOAD_LEN + FRAME_PADDING.len(), MAX_FRAME_LEN);
//! ```

// ============================================================================
// Frame Layout
// ============================================================================

/// Two-byte marker opening every frame (ASCII "CM").
pub const FRAME_MARKER: [u8; 2] = [0x43, 0x4D];

/// Bytes before the payload: marker (2) + command + reader id + length.
pub const FRAME_HEADER_LEN: usize = 5;

/// Fixed trailer appended after the payload of every encoded frame.
///
/// Not a checksum. The decoder never validates it.
pub const FRAME_PADDING: [u8; 2] = [0x00, 0x00];

/// Largest payload the one-byte length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Largest encoded frame, padding included.
pub const MAX_FRAME_LEN: usize = FRAME_HEADER_LEN + MAX_PAYLOAD_LEN + 2;

/// Reader id used by every reader observed in the field.
pub const DEFAULT_READER_ID: u8 = 0x00;

// ============================================================================
// Tag Payload Layout
// ============================================================================

/// Minimum inventory payload: antenna + PC word + at least one EPC byte.
pub const MIN_TAG_PAYLOAD_LEN: usize = 4;

/// Offset of the first EPC byte in an inventory payload.
pub const EPC_OFFSET: usize = 3;

/// Largest EPC length (bytes) accepted from the PC word.
pub const MAX_EPC_LEN: usize = 32;

/// EPC length assumed when the PC word is unusable (96-bit EPC).
pub const DEFAULT_EPC_LEN: usize = 12;

// ============================================================================
// Connection Defaults (milliseconds)
// ============================================================================

/// Default TCP port of the reader.
pub const DEFAULT_READER_PORT: u16 = 20058;

/// Delay between a lost connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 500;

/// Interval between host-initiated heartbeats while connected.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 3_000;

/// Interval between inventory requests while inventory is active.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Interval between stale-connection checks.
pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: u64 = 5_000;

/// Silence after which a connection is considered dead.
pub const DEFAULT_STALE_TIMEOUT_MS: u64 = 30_000;

/// Time the reader is given to finish booting before auto-read starts.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Timeout for a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Timeout for writing one frame to the socket.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 2_000;

// ============================================================================
// Scan Defaults
// ============================================================================

/// Timeout for a protocol-verifying handshake.
pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 1_500;

/// Timeout for a connect-only probe.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 200;

/// Simultaneous connect-only probes per batch.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 30;

/// Ports tried first, on the saved address and in subnet phase A.
pub const PRIORITY_PORTS: [u16; 4] = [20058, 4001, 6000, 8160];

/// Common RFID and industrial ports used by the deep fallback.
pub const DEEP_SCAN_PORTS: [u16; 12] = [
    20058, 4001, 6000, 8160, 2022, 5000, 7000, 8080, 9090, 10001, 27011, 502,
];
