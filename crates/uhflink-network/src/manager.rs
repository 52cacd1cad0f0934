//! Reader connection manager.
//!
//! The [`ConnectionManager`] owns the single socket to a reader. It runs as
//! one tokio task (an actor): commands arrive from [`ConnectionHandle`]s over
//! an mpsc channel, events leave over a broadcast channel, and socket reads,
//! timers and the in-flight connect attempt are multiplexed with
//! `tokio::select!` inside that task. Nothing else touches the socket, the
//! receive buffer or the inventory store.
//!
//! # Architecture
//!
//! ```text
//!  ConnectionHandle ──(mpsc Command)──►┌───────────────────────┐
//!  ConnectionHandle ──────────────────►│  manager task         │──(TCP)──► reader
//!                                      │  state, Session,      │
//!  subscribers ◄──(broadcast event)────│  InventoryStore       │
//!                                      └───────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──connect──► Connecting ──socket open──► Connected
//!                               │                          │
//!                       error / timeout              closed / error / stale
//!                               ▼                          ▼
//!                         Reconnecting ◄───────────────────┘
//!                               │
//!                      reconnect delay elapsed
//!                               ▼
//!                          Connecting
//! ```
//!
//! `disconnect()` takes any state to `Disconnected` and clears the intent to
//! be connected; it is the only way the reconnect cycle ends.
//!
//! # Example
//!
//! ```no_run
//! use uhflink_core::ReaderEvent;
//! use uhflink_network::{ConnectionConfig, ConnectionManager, TcpConnector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = ConnectionManager::new(ConnectionConfig::default(), TcpConnector).start();
//! let mut events = handle.subscribe();
//!
//! handle.connect("192.168.1.155:20058".parse()?).await?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let ReaderEvent::TagRead(tag) = event {
//!         println!("{} on antenna {}", tag.epc, tag.antenna);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use bytes::Buf;
use std::future::pending;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};
use uhflink_core::{
    ConnectionState, ConnectionStatus, Error, ReaderAddress, ReaderEvent, TagRead,
    constants::{
        DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HEALTH_CHECK_INTERVAL_MS,
        DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RECONNECT_DELAY_MS,
        DEFAULT_SETTLE_DELAY_MS, DEFAULT_STALE_TIMEOUT_MS, DEFAULT_WRITE_TIMEOUT_MS,
    },
};
use uhflink_inventory::InventoryStore;
use uhflink_protocol::{CommandCode, Frame, decode, extract_tag_read};

use crate::connector::Connector;
use crate::error::{NetworkError, NetworkResult};
use crate::session::Session;

/// Command channel depth.
const COMMAND_CAPACITY: usize = 32;

/// Event channel depth; slow subscribers lag rather than block the manager.
const EVENT_CAPACITY: usize = 256;

/// A reader heartbeat this soon after ours is its reply and is not echoed.
const HEARTBEAT_REPLY_WINDOW: Duration = Duration::from_secs(1);

/// Timing policy of a connection manager.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use uhflink_network::ConnectionConfig;
///
/// let config = ConnectionConfig {
///     reconnect_delay: Duration::from_secs(2),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay: Duration,

    /// Period of host-sent `HEARTBEAT` frames.
    pub heartbeat_interval: Duration,

    /// Period of `START_INVENTORY` polls while inventory is active.
    pub poll_interval: Duration,

    /// Period of the stale-connection check.
    pub health_check_interval: Duration,

    /// Silence longer than this closes the connection.
    pub stale_timeout: Duration,

    /// Delay between socket open and the auto-read start.
    pub settle_delay: Duration,

    pub connect_timeout: Duration,

    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            health_check_interval: Duration::from_millis(DEFAULT_HEALTH_CHECK_INTERVAL_MS),
            stale_timeout: Duration::from_millis(DEFAULT_STALE_TIMEOUT_MS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
        }
    }
}

impl ConnectionConfig {
    /// Reject zero periods and timeouts. A zero settle delay is allowed.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> uhflink_core::Result<()> {
        let fields = [
            ("reconnect_delay", self.reconnect_delay),
            ("heartbeat_interval", self.heartbeat_interval),
            ("poll_interval", self.poll_interval),
            ("health_check_interval", self.health_check_interval),
            ("stale_timeout", self.stale_timeout),
            ("connect_timeout", self.connect_timeout),
            ("write_timeout", self.write_timeout),
        ];
        match fields.iter().find(|(_, value)| value.is_zero()) {
            Some((name, _)) => Err(Error::Config(format!("{name} must be greater than zero"))),
            None => Ok(()),
        }
    }
}

/// Requests sent from handles to the manager task.
enum Command {
    Connect {
        addr: ReaderAddress,
        reply: oneshot::Sender<()>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    StartInventory {
        reply: oneshot::Sender<NetworkResult<()>>,
    },
    StopInventory {
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<ConnectionStatus>,
    },
    Tags {
        reply: oneshot::Sender<Vec<TagRead>>,
    },
    ClearTags {
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running [`ConnectionManager`].
///
/// Every method acknowledges as soon as the manager has applied the command;
/// connection outcomes arrive later as [`ReaderEvent::StatusChanged`].
#[derive(Clone)]
pub struct ConnectionHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<ReaderEvent>,
}

impl ConnectionHandle {
    /// Connect to `addr`, replacing any existing connection.
    ///
    /// Sets the intent to stay connected: failures and drops are retried
    /// until [`disconnect`](Self::disconnect).
    pub async fn connect(&self, addr: ReaderAddress) -> NetworkResult<()> {
        self.request(|reply| Command::Connect { addr, reply }).await
    }

    /// Close the connection and stop reconnecting.
    pub async fn disconnect(&self) -> NetworkResult<()> {
        self.request(|reply| Command::Disconnect { reply }).await
    }

    /// Clear the tag store and start polling inventory.
    ///
    /// # Errors
    /// Returns [`NetworkError::NotConnected`] unless the reader is connected.
    pub async fn start_inventory(&self) -> NetworkResult<()> {
        self.request(|reply| Command::StartInventory { reply }).await?
    }

    pub async fn stop_inventory(&self) -> NetworkResult<()> {
        self.request(|reply| Command::StopInventory { reply }).await
    }

    pub async fn status(&self) -> NetworkResult<ConnectionStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    /// Snapshot of the deduplicated tags of the current session.
    pub async fn tags(&self) -> NetworkResult<Vec<TagRead>> {
        self.request(|reply| Command::Tags { reply }).await
    }

    pub async fn clear_tags(&self) -> NetworkResult<()> {
        self.request(|reply| Command::ClearTags { reply }).await
    }

    /// Disconnect and stop the manager task. Other handles stop working.
    pub async fn shutdown(&self) -> NetworkResult<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    /// Sender for the manager's event stream, for components that publish
    /// alongside it (scan progress).
    pub fn event_sender(&self) -> broadcast::Sender<ReaderEvent> {
        self.events.clone()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> NetworkResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| NetworkError::ManagerStopped)?;
        response.await.map_err(|_| NetworkError::ManagerStopped)
    }
}

/// Builder for the connection manager task.
pub struct ConnectionManager<C: Connector> {
    config: ConnectionConfig,
    connector: C,
    events: broadcast::Sender<ReaderEvent>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(config: ConnectionConfig, connector: C) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            connector,
            events,
        }
    }

    /// Publish on an existing event channel instead of a private one.
    pub fn with_event_sender(mut self, events: broadcast::Sender<ReaderEvent>) -> Self {
        self.events = events;
        self
    }

    /// Spawn the manager task and return a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> ConnectionHandle {
        let (commands, inbox) = mpsc::channel(COMMAND_CAPACITY);
        let handle = ConnectionHandle {
            commands,
            events: self.events.clone(),
        };

        let actor = Actor {
            config: self.config,
            connector: Arc::new(self.connector),
            inbox,
            events: self.events,
            state: ConnectionState::Disconnected,
            address: None,
            user_wants_connection: false,
            inventory_active: false,
            firmware_version: None,
            store: InventoryStore::new(),
            attempt: None,
            reconnect_at: None,
            session: None,
            published: None,
        };
        tokio::spawn(actor.run());

        handle
    }
}

type Attempt<S> = JoinHandle<NetworkResult<S>>;

/// What woke the manager loop.
enum Wake<S> {
    Command(Option<Command>),
    AttemptFinished(NetworkResult<S>),
    ReconnectDue,
    Read(io::Result<usize>),
    Heartbeat,
    Poll,
    HealthCheck,
    Settled,
}

/// Why the manager stops running.
struct Stop;

struct Actor<C: Connector> {
    config: ConnectionConfig,
    connector: Arc<C>,
    inbox: mpsc::Receiver<Command>,
    events: broadcast::Sender<ReaderEvent>,

    state: ConnectionState,
    address: Option<ReaderAddress>,
    user_wants_connection: bool,
    inventory_active: bool,
    firmware_version: Option<String>,
    store: InventoryStore,

    attempt: Option<Attempt<C::Stream>>,
    reconnect_at: Option<Instant>,
    session: Option<Session<C::Stream>>,

    /// Last status sent to subscribers.
    published: Option<ConnectionStatus>,
}

impl<C: Connector> Actor<C> {
    async fn run(mut self) {
        debug!("connection manager started");

        loop {
            let wake = self.next_wake().await;
            let outcome = self.handle(wake).await;
            self.publish_status();
            if outcome.is_err() {
                break;
            }
        }

        self.release();
        debug!("connection manager stopped");
    }

    async fn next_wake(&mut self) -> Wake<C::Stream> {
        let inbox = &mut self.inbox;

        match self.session.as_mut() {
            Some(session) => {
                let polling = self.inventory_active;
                let settle = sleep_until_opt(session.settle_at);
                tokio::select! {
                    command = inbox.recv() => Wake::Command(command),
                    read = session.stream.read_buf(&mut session.buffer) => Wake::Read(read),
                    _ = session.heartbeat.tick() => Wake::Heartbeat,
                    _ = session.poll.tick(), if polling => Wake::Poll,
                    _ = session.health.tick() => Wake::HealthCheck,
                    _ = settle => Wake::Settled,
                }
            }
            None => {
                let reconnect = sleep_until_opt(self.reconnect_at);
                tokio::select! {
                    command = inbox.recv() => Wake::Command(command),
                    result = join_attempt(&mut self.attempt) => Wake::AttemptFinished(result),
                    _ = reconnect => Wake::ReconnectDue,
                }
            }
        }
    }

    async fn handle(&mut self, wake: Wake<C::Stream>) -> Result<(), Stop> {
        match wake {
            Wake::Command(Some(command)) => return self.handle_command(command).await,
            Wake::Command(None) => {
                debug!("all handles dropped");
                return Err(Stop);
            }
            Wake::AttemptFinished(Ok(stream)) => self.on_connected(stream),
            Wake::AttemptFinished(Err(e)) => {
                warn!(addr = ?self.address, error = %e, "connect attempt failed");
                self.after_connection_lost();
            }
            Wake::ReconnectDue => {
                self.reconnect_at = None;
                if self.user_wants_connection && self.session.is_none() && self.attempt.is_none() {
                    self.start_attempt();
                }
            }
            Wake::Read(Ok(0)) => self.connection_lost(NetworkError::ConnectionClosed),
            Wake::Read(Ok(n)) => self.on_data(n).await,
            Wake::Read(Err(e)) => self.connection_lost(NetworkError::Io(e)),
            Wake::Heartbeat => self.send_or_drop(CommandCode::Heartbeat).await,
            Wake::Poll => self.send_or_drop(CommandCode::StartInventory).await,
            Wake::HealthCheck => self.check_health(),
            Wake::Settled => self.on_settled().await,
        }
        Ok(())
    }

    async fn handle_command(&mut self, command: Command) -> Result<(), Stop> {
        match command {
            Command::Connect { addr, reply } => {
                self.connect(addr);
                let _ = reply.send(());
            }
            Command::Disconnect { reply } => {
                self.disconnect();
                let _ = reply.send(());
            }
            Command::StartInventory { reply } => {
                let result = self.start_inventory().await;
                let _ = reply.send(result);
            }
            Command::StopInventory { reply } => {
                self.stop_inventory().await;
                let _ = reply.send(());
            }
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
            Command::Tags { reply } => {
                let _ = reply.send(self.store.list());
            }
            Command::ClearTags { reply } => {
                self.store.clear();
                let _ = reply.send(());
            }
            Command::Shutdown { reply } => {
                self.disconnect();
                self.publish_status();
                let _ = reply.send(());
                return Err(Stop);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Move to `target`, enforcing the connection state machine.
    ///
    /// Leaving `Connected` always ends the inventory session.
    fn transition(&mut self, target: ConnectionState) -> uhflink_core::Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        trace!(from = %self.state, to = %target, "state transition");
        self.state = target;
        if target != ConnectionState::Connected {
            self.inventory_active = false;
        }
        Ok(())
    }

    /// Transition that cannot fail given the caller's own checks; an
    /// invalid one is logged and ignored.
    fn enter(&mut self, target: ConnectionState) {
        if let Err(e) = self.transition(target) {
            warn!(error = %e, "rejected state transition");
        }
    }

    fn connect(&mut self, addr: ReaderAddress) {
        info!(%addr, "connect requested");
        self.release();
        if self.state != ConnectionState::Disconnected {
            self.enter(ConnectionState::Disconnected);
        }
        self.user_wants_connection = true;
        self.address = Some(addr);
        self.start_attempt();
    }

    fn disconnect(&mut self) {
        if self.user_wants_connection || self.state != ConnectionState::Disconnected {
            info!(addr = ?self.address, "disconnect requested");
        }
        self.user_wants_connection = false;
        self.release();
        if self.state != ConnectionState::Disconnected {
            self.enter(ConnectionState::Disconnected);
        }
    }

    /// Drop the session, the in-flight attempt and the reconnect timer.
    fn release(&mut self) {
        if let Some(attempt) = self.attempt.take() {
            attempt.abort();
        }
        self.reconnect_at = None;
        if self.session.take().is_some() {
            debug!("socket closed");
        }
    }

    fn start_attempt(&mut self) {
        let Some(addr) = self.address else {
            return;
        };
        self.enter(ConnectionState::Connecting);
        self.firmware_version = None;

        let connector = Arc::clone(&self.connector);
        let limit = self.config.connect_timeout;
        debug!(%addr, "opening socket");
        self.attempt = Some(tokio::spawn(async move {
            match time::timeout(limit, connector.connect(addr.socket_addr())).await {
                Ok(Ok(stream)) => Ok(stream),
                Ok(Err(e)) => Err(NetworkError::Io(e)),
                Err(_) => Err(NetworkError::ConnectionTimeout(limit.as_millis() as u64)),
            }
        }));
    }

    fn on_connected(&mut self, stream: C::Stream) {
        if !self.user_wants_connection {
            self.enter(ConnectionState::Disconnected);
            return;
        }
        self.enter(ConnectionState::Connected);
        self.session = Some(Session::open(stream, &self.config));
        self.inventory_active = true;
        info!(addr = ?self.address, "reader connected");
    }

    fn connection_lost(&mut self, reason: NetworkError) {
        warn!(addr = ?self.address, error = %reason, "reader connection lost");
        self.session = None;
        self.after_connection_lost();
    }

    /// Arm the reconnect timer if the operator still wants a connection.
    fn after_connection_lost(&mut self) {
        if self.user_wants_connection {
            self.enter(ConnectionState::Reconnecting);
            self.reconnect_at = Some(Instant::now() + self.config.reconnect_delay);
            debug!(delay = ?self.config.reconnect_delay, "reconnect scheduled");
        } else {
            self.enter(ConnectionState::Disconnected);
        }
    }

    // ------------------------------------------------------------------
    // Connected-state work
    // ------------------------------------------------------------------

    async fn on_settled(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.settle_at = None;
        }
        if self.inventory_active {
            self.send_or_drop(CommandCode::StartAutoRead).await;
        }
        self.send_or_drop(CommandCode::GetVersion).await;
    }

    fn check_health(&mut self) {
        let stale = self
            .session
            .as_ref()
            .is_some_and(|session| session.is_stale(self.config.stale_timeout));
        if stale {
            warn!(timeout = ?self.config.stale_timeout, "no data from reader, closing stale connection");
            self.connection_lost(NetworkError::ConnectionTimeout(
                self.config.stale_timeout.as_millis() as u64,
            ));
        }
    }

    async fn start_inventory(&mut self) -> NetworkResult<()> {
        if !self.state.is_connected() {
            return Err(NetworkError::NotConnected);
        }
        self.store.clear();
        self.inventory_active = true;
        info!("inventory started");
        self.send_or_drop(CommandCode::StartInventory).await;
        Ok(())
    }

    async fn stop_inventory(&mut self) {
        self.inventory_active = false;
        info!("inventory stopped");
        if self.session.is_some() {
            self.send_or_drop(CommandCode::StopInventory).await;
        }
    }

    /// Decode everything buffered and dispatch frames in stream order.
    async fn on_data(&mut self, bytes: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.last_rx = Instant::now();
        trace!(bytes, buffered = session.buffer.len(), "received");

        let decoded = decode(&session.buffer);
        let consumed = decoded.consumed(session.buffer.len());
        let frames = decoded.frames;
        session.buffer.advance(consumed);

        for frame in frames {
            self.dispatch(frame).await;
            if self.session.is_none() {
                break;
            }
        }
    }

    async fn dispatch(&mut self, frame: Frame) {
        trace!(%frame, "frame received");

        if frame.is_heartbeat() {
            let is_reply = self
                .session
                .as_mut()
                .is_some_and(|session| session.take_heartbeat_reply(HEARTBEAT_REPLY_WINDOW));
            if is_reply {
                trace!("heartbeat reply");
            } else {
                self.send_or_drop(CommandCode::Heartbeat).await;
            }
        } else if frame.is_inventory_response() {
            match extract_tag_read(frame.payload()) {
                Some(sighting) => {
                    self.store.record_sighting(sighting.clone());
                    let _ = self.events.send(ReaderEvent::TagRead(sighting));
                }
                None => debug!(%frame, "dropping malformed inventory payload"),
            }
        } else {
            match frame.command_code() {
                Some(CommandCode::GetVersion) if !frame.payload().is_empty() => {
                    let version = String::from_utf8_lossy(frame.payload())
                        .trim_matches(char::from(0))
                        .trim()
                        .to_string();
                    info!(%version, "reader firmware");
                    self.firmware_version = Some(version);
                }
                Some(CommandCode::DeviceInfoReport) => {
                    debug!(len = frame.payload().len(), "device info report");
                }
                _ => trace!(%frame, "ignoring frame"),
            }
        }
    }

    /// Write a request; a failed or timed-out write counts as connection loss.
    async fn send_or_drop(&mut self, command: CommandCode) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let bytes = Frame::request(command).encode();
        let limit = self.config.write_timeout;
        let result = match time::timeout(limit, session.stream.write_all(&bytes)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(NetworkError::Io(e)),
            Err(_) => Err(NetworkError::WriteTimeout(limit.as_millis() as u64)),
        };
        if result.is_ok() && command == CommandCode::Heartbeat {
            session.last_heartbeat = Some(Instant::now());
        }

        match result {
            Ok(()) => trace!(%command, "sent"),
            Err(e) => self.connection_lost(e),
        }
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            connected: self.state.is_connected(),
            ip: self.address.map(|addr| addr.ip),
            port: self.address.map(|addr| addr.port),
            inventory_active: self.inventory_active,
            state: self.state,
            firmware_version: self.firmware_version.clone(),
        }
    }

    /// Broadcast the status if it changed since the last broadcast.
    fn publish_status(&mut self) {
        let status = self.status();
        if self.published.as_ref() != Some(&status) {
            let _ = self.events.send(ReaderEvent::StatusChanged(status.clone()));
            self.published = Some(status);
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => pending().await,
    }
}

/// Wait for the in-flight attempt; pends forever when there is none.
///
/// Cancel-safe: the handle stays in place until the attempt completes.
async fn join_attempt<S>(attempt: &mut Option<Attempt<S>>) -> NetworkResult<S> {
    let Some(handle) = attempt.as_mut() else {
        return pending().await;
    };
    let joined = handle.await;
    *attempt = None;
    joined.unwrap_or_else(|e| Err(NetworkError::Io(io::Error::other(e))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConnectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reconnect_delay, Duration::from_millis(500));
        assert_eq!(config.stale_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ConnectionConfig {
            heartbeat_interval: Duration::ZERO,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("heartbeat_interval"));
    }

    #[test]
    fn test_zero_settle_delay_allowed() {
        let config = ConnectionConfig {
            settle_delay: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
