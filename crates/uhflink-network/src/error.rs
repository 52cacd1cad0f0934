use thiserror::Error;

/// Errors surfaced by the network layer.
///
/// Transient socket failures inside the connection manager never reach the
/// caller as errors; they drive the reconnect cycle and show up as status
/// changes. These variants cover what a caller can act on.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The manager task has stopped and no longer accepts commands.
    #[error("Connection manager stopped")]
    ManagerStopped,

    /// The operation needs an open reader connection.
    #[error("Not connected to reader")]
    NotConnected,

    /// Connection attempt timed out
    #[error("Connection timeout after {0}ms")]
    ConnectionTimeout(u64),

    /// Write operation timed out
    #[error("Write timeout after {0}ms")]
    WriteTimeout(u64),

    /// Peer closed the socket.
    #[error("Connection closed by reader")]
    ConnectionClosed,

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = std::result::Result<T, NetworkError>;
