//! Single-endpoint probes used by the scanner.

use bytes::BytesMut;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{Instant, timeout, timeout_at};
use tracing::trace;
use uhflink_core::{RejectReason, constants::FRAME_MARKER};
use uhflink_protocol::{CommandCode, Frame};

use crate::connector::Connector;

/// Give up on endpoints that stream this much without a marker.
const MAX_HANDSHAKE_BYTES: usize = 4 * 1024;

/// Whether a TCP connection to `addr` opens within `limit`.
///
/// The stream is dropped immediately; nothing is written.
pub async fn connect_only<C: Connector>(connector: &C, addr: SocketAddr, limit: Duration) -> bool {
    matches!(timeout(limit, connector.connect(addr)).await, Ok(Ok(_)))
}

/// Confirm that `addr` speaks the CM protocol.
///
/// Sends a `HEARTBEAT` frame and accumulates the reply until the `CM` marker
/// appears anywhere in it. The whole exchange, connect included, is bounded
/// by `limit`.
///
/// # Errors
///
/// - [`RejectReason::Timeout`]: nothing came back in time
/// - [`RejectReason::InvalidProtocol`]: bytes came back without a marker
/// - [`RejectReason::ConnectionClosed`]: the peer hung up without answering
/// - [`RejectReason::Socket`]: connect or I/O failure, with its message
pub async fn verify_handshake<C: Connector>(
    connector: &C,
    addr: SocketAddr,
    limit: Duration,
) -> Result<(), RejectReason> {
    let deadline = Instant::now() + limit;

    let mut stream = match timeout_at(deadline, connector.connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(RejectReason::Socket(e.to_string())),
        Err(_) => return Err(RejectReason::Timeout),
    };

    let hello = Frame::request(CommandCode::Heartbeat).encode();
    match timeout_at(deadline, stream.write_all(&hello)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(RejectReason::Socket(e.to_string())),
        Err(_) => return Err(RejectReason::Timeout),
    }

    let mut received = BytesMut::with_capacity(64);
    loop {
        let silent = received.is_empty();
        match timeout_at(deadline, stream.read_buf(&mut received)).await {
            Ok(Ok(0)) if silent => return Err(RejectReason::ConnectionClosed),
            Ok(Ok(0)) => return Err(RejectReason::InvalidProtocol),
            Ok(Ok(n)) => {
                trace!(%addr, bytes = n, "handshake data");
                if contains_marker(&received) {
                    return Ok(());
                }
                if received.len() >= MAX_HANDSHAKE_BYTES {
                    return Err(RejectReason::InvalidProtocol);
                }
            }
            Ok(Err(e)) => return Err(RejectReason::Socket(e.to_string())),
            Err(_) if silent => return Err(RejectReason::Timeout),
            Err(_) => return Err(RejectReason::InvalidProtocol),
        }
    }
}

fn contains_marker(bytes: &[u8]) -> bool {
    bytes.windows(FRAME_MARKER.len()).any(|w| w == FRAME_MARKER)
}
