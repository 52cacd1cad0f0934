//! Shared test doubles for the network integration tests.
//!
//! - [`PipeConnector`]: every connect yields an in-memory duplex stream whose
//!   reader end is handed to the test
//! - [`ScriptedConnector`]: per-endpoint behaviour for scanner tests
//! - event helpers that wait on the manager's broadcast stream

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::{broadcast, mpsc};
use uhflink_core::{ConnectionState, ConnectionStatus, ReaderEvent, TagSighting};
use uhflink_network::Connector;
use uhflink_protocol::{CommandCode, Frame};

/// Duplex capacity; large enough that an unread reader end never blocks
/// the manager's writes during a test.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Connector backed by `tokio::io::duplex`.
#[derive(Clone)]
pub struct PipeConnector {
    servers: mpsc::UnboundedSender<DuplexStream>,
    attempts: Arc<AtomicUsize>,
    refusing: Arc<AtomicBool>,
}

impl PipeConnector {
    /// Returns the connector and the receiver of reader-side stream ends.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DuplexStream>) {
        let (servers, rx) = mpsc::unbounded_channel();
        let connector = Self {
            servers,
            attempts: Arc::new(AtomicUsize::new(0)),
            refusing: Arc::new(AtomicBool::new(false)),
        };
        (connector, rx)
    }

    /// Make subsequent connects fail with `ConnectionRefused`.
    pub fn refuse(&self, refuse: bool) {
        self.refusing.store(refuse, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.attempts)
    }
}

impl Connector for PipeConnector {
    type Stream = DuplexStream;

    fn connect(&self, _addr: SocketAddr) -> impl Future<Output = io::Result<DuplexStream>> + Send {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let refusing = self.refusing.load(Ordering::SeqCst);
        let servers = self.servers.clone();
        async move {
            if refusing {
                return Err(io::Error::from(io::ErrorKind::ConnectionRefused));
            }
            let (client, server) = tokio::io::duplex(PIPE_CAPACITY);
            servers
                .send(server)
                .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
            Ok(client)
        }
    }
}

/// How a scripted endpoint reacts to a connection.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// Connection refused.
    Refuse,
    /// Accepts and never answers.
    Silent,
    /// Accepts and answers the first write with a heartbeat frame.
    Reader,
    /// Accepts and answers the first write with these bytes.
    Garbage(&'static [u8]),
}

/// Connector that replays per-address behaviour and records every attempt.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    endpoints: HashMap<SocketAddr, Endpoint>,
    log: Arc<Mutex<Vec<SocketAddr>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, addr: &str, endpoint: Endpoint) -> Self {
        self.endpoints.insert(addr.parse().unwrap(), endpoint);
        self
    }

    /// Every address connected to so far, in order.
    pub fn log(&self) -> Arc<Mutex<Vec<SocketAddr>>> {
        Arc::clone(&self.log)
    }
}

impl Connector for ScriptedConnector {
    type Stream = DuplexStream;

    fn connect(&self, addr: SocketAddr) -> impl Future<Output = io::Result<DuplexStream>> + Send {
        self.log.lock().unwrap().push(addr);
        let endpoint = self.endpoints.get(&addr).cloned().unwrap_or(Endpoint::Refuse);

        async move {
            let reply: Option<Vec<u8>> = match endpoint {
                Endpoint::Refuse => {
                    return Err(io::Error::from(io::ErrorKind::ConnectionRefused));
                }
                Endpoint::Silent => None,
                Endpoint::Reader => Some(Frame::request(CommandCode::Heartbeat).encode().to_vec()),
                Endpoint::Garbage(bytes) => Some(bytes.to_vec()),
            };

            let (client, mut server) = tokio::io::duplex(1024);
            tokio::spawn(async move {
                let mut buf = [0u8; 64];
                if let Some(reply) = reply {
                    if matches!(server.read(&mut buf).await, Ok(n) if n > 0) {
                        let _ = server.write_all(&reply).await;
                    }
                }
                // Hold the stream open until the client hangs up.
                while matches!(server.read(&mut buf).await, Ok(n) if n > 0) {}
            });
            Ok(client)
        }
    }
}

/// Wait for a status event in `state`.
pub async fn wait_for_state(
    events: &mut broadcast::Receiver<ReaderEvent>,
    state: ConnectionState,
) -> ConnectionStatus {
    wait_for_status(events, |status| status.state == state).await
}

/// Wait for a status event matching `predicate`.
pub async fn wait_for_status(
    events: &mut broadcast::Receiver<ReaderEvent>,
    predicate: impl Fn(&ConnectionStatus) -> bool,
) -> ConnectionStatus {
    loop {
        match events.recv().await.expect("event stream closed") {
            ReaderEvent::StatusChanged(status) if predicate(&status) => return status,
            _ => {}
        }
    }
}

/// Wait for the next tag event.
pub async fn wait_for_tag(events: &mut broadcast::Receiver<ReaderEvent>) -> TagSighting {
    loop {
        if let ReaderEvent::TagRead(tag) = events.recv().await.expect("event stream closed") {
            return tag;
        }
    }
}

/// Inventory payload with PC = 0 and an 11-byte EPC, so the EPC length
/// falls back to what the payload holds.
pub fn inventory_payload() -> Vec<u8> {
    let mut payload = vec![0x01, 0x00, 0x00];
    payload.extend_from_slice(&[0xE2, 0x00, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
    payload.push(0xC8);
    payload
}
