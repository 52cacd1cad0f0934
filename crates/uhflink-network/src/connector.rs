//! Transport seam for opening reader sockets.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Opens byte streams to reader endpoints.
///
/// The connection manager and the scanner only ever talk to a reader through
/// this trait, so tests can substitute in-memory streams for sockets.
///
/// # Implementation Note
///
/// Uses return-position `impl Future` (Edition 2024) so the returned future
/// can be required to be `Send` without the async-trait crate.
pub trait Connector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a stream to `addr`. Timeouts are applied by the caller.
    fn connect(&self, addr: SocketAddr) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Plain TCP connector with Nagle disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, addr: SocketAddr) -> impl Future<Output = io::Result<TcpStream>> + Send {
        async move {
            let stream = TcpStream::connect(addr).await?;
            // Frames are tiny; do not let them sit in the send buffer.
            stream.set_nodelay(true)?;
            Ok(stream)
        }
    }
}
