//! TCP listener and per-connection reader behaviour.

use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};
use uhflink_core::constants::{DEFAULT_READER_ID, MAX_PAYLOAD_LEN};
use uhflink_protocol::{CmCodec, CommandCode, Frame};

use crate::config::EmulatorConfig;

/// A host heartbeat arriving this soon after one of ours is its echo.
const HEARTBEAT_REPLY_WINDOW: Duration = Duration::from_secs(1);

/// Emulator errors
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid emulator config: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] uhflink_core::Error),
}

/// A bound, not yet running, emulated reader.
#[derive(Debug)]
pub struct ReaderEmulator {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: Arc<EmulatorConfig>,
}

impl ReaderEmulator {
    /// Bind the listening socket.
    ///
    /// Port 0 picks a free port; see [`local_addr`](Self::local_addr).
    pub async fn bind(config: EmulatorConfig) -> Result<Self, EmulatorError> {
        if config.heartbeat_interval.is_zero() || config.report_interval.is_zero() {
            return Err(EmulatorError::Config(
                "heartbeat and report intervals must be non-zero".into(),
            ));
        }

        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| EmulatorError::BindFailed {
                addr: config.bind_addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;

        info!(
            %local_addr,
            tags = config.tags.len(),
            firmware = %config.firmware_version,
            "reader emulator listening"
        );

        Ok(Self {
            listener,
            local_addr,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Accept hosts until the listener fails. Each host gets its own task.
    pub async fn run(self) -> Result<(), EmulatorError> {
        let mut connections = JoinSet::new();

        loop {
            let (stream, peer) = self.listener.accept().await?;
            info!(%peer, "host connected");

            let config = Arc::clone(&self.config);
            connections.spawn(async move {
                if let Err(e) = serve(stream, &config).await {
                    warn!(%peer, error = %e, "connection failed");
                }
                info!(%peer, "host disconnected");
            });

            while connections.try_join_next().is_some() {}
        }
    }

    /// Run on a background task.
    pub fn spawn(self) -> EmulatorHandle {
        let local_addr = self.local_addr;
        let task = tokio::spawn(async move {
            if let Err(e) = self.run().await {
                warn!(error = %e, "reader emulator stopped");
            }
        });
        EmulatorHandle { local_addr, task }
    }
}

/// Running emulator. Dropping it stops the listener and every connection.
#[derive(Debug)]
pub struct EmulatorHandle {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl EmulatorHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and close every open connection.
    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
        debug!(local_addr = %self.local_addr, "reader emulator shut down");
    }
}

impl Drop for EmulatorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, config: &EmulatorConfig) -> Result<(), EmulatorError> {
    stream.set_nodelay(true)?;
    let mut framed = Framed::new(stream, CmCodec::new());
    let mut reader = ReaderState::new(config);

    let start = Instant::now();
    let mut heartbeat = interval_at(start + config.heartbeat_interval, config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut reports = interval_at(start + config.report_interval, config.report_interval);
    reports.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let replies = tokio::select! {
            frame = framed.next() => match frame {
                Some(frame) => reader.respond(&frame?, Instant::now()),
                None => return Ok(()),
            },
            _ = heartbeat.tick() => vec![reader.heartbeat(Instant::now())],
            _ = reports.tick(), if reader.auto_read => reader.tag_frames(CommandCode::StartAutoRead),
        };

        if replies.is_empty() {
            continue;
        }
        for reply in replies {
            framed.feed(reply).await?;
        }
        framed.flush().await?;
    }
}

/// Protocol state of one emulated connection.
#[derive(Debug)]
struct ReaderState<'a> {
    config: &'a EmulatorConfig,
    auto_read: bool,
    last_heartbeat: Option<Instant>,
}

impl<'a> ReaderState<'a> {
    fn new(config: &'a EmulatorConfig) -> Self {
        Self {
            config,
            auto_read: false,
            last_heartbeat: None,
        }
    }

    /// Frames to send back for one host frame.
    fn respond(&mut self, frame: &Frame, now: Instant) -> Vec<Frame> {
        trace!(%frame, "host frame");

        match frame.command_code() {
            Some(CommandCode::Heartbeat) => {
                let echo = self
                    .last_heartbeat
                    .is_some_and(|sent| now.duration_since(sent) < HEARTBEAT_REPLY_WINDOW);
                if echo {
                    Vec::new()
                } else {
                    vec![self.heartbeat(now)]
                }
            }
            Some(CommandCode::StartInventory) => self.tag_frames(CommandCode::StartInventory),
            Some(CommandCode::StartAutoRead) => {
                self.auto_read = true;
                self.tag_frames(CommandCode::StartAutoRead)
            }
            Some(CommandCode::StopAutoRead) => {
                self.auto_read = false;
                Vec::new()
            }
            Some(CommandCode::GetVersion) => {
                let firmware = self.config.firmware_version.as_bytes();
                let firmware = &firmware[..firmware.len().min(MAX_PAYLOAD_LEN)];
                Frame::new(
                    CommandCode::GetVersion.as_u8(),
                    DEFAULT_READER_ID,
                    firmware.to_vec(),
                )
                .into_iter()
                .collect()
            }
            _ => {
                debug!(command = frame.command(), "ignoring command");
                Vec::new()
            }
        }
    }

    fn heartbeat(&mut self, now: Instant) -> Frame {
        self.last_heartbeat = Some(now);
        Frame::request(CommandCode::Heartbeat)
    }

    /// One inventory response per tag in the field.
    fn tag_frames(&self, code: CommandCode) -> Vec<Frame> {
        self.config
            .tags
            .iter()
            .filter_map(|tag| Frame::new(code.as_u8(), DEFAULT_READER_ID, tag.payload()).ok())
            .collect()
    }
}
