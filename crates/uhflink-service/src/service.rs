use std::path::PathBuf;
use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};
use uhflink_core::{
    ConnectionStatus, Error, ReaderAddress, ReaderEvent, ScanOutcome, TagRead,
};
use uhflink_network::{
    ConnectionHandle, ConnectionManager, Connector, InterfaceSource, NetworkScanner,
    SystemInterfaces, TcpConnector,
};

use crate::config::ReaderConfig;
use crate::error::ServiceResult;

/// The reader subsystem as one instantiable object.
///
/// Commands return as soon as they are applied; connection and scan
/// outcomes are published on [`subscribe`](Self::subscribe) as
/// `status-changed`, `tag-read` and `scan-progress` events.
///
/// # Example
///
/// ```no_run
/// use uhflink_core::ReaderEvent;
/// use uhflink_service::{ReaderConfig, ReaderService};
///
/// # async fn example() -> uhflink_service::ServiceResult<()> {
/// let service = ReaderService::open("reader.json")?;
/// let mut events = service.subscribe();
///
/// let outcome = service.auto_connect().await?;
/// println!("{outcome:?}");
///
/// while let Ok(event) = events.recv().await {
///     if let ReaderEvent::TagRead(tag) = event {
///         println!("{}", tag.epc);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ReaderService<C = TcpConnector, I = SystemInterfaces> {
    config: RwLock<ReaderConfig>,
    config_path: Option<PathBuf>,
    connection: ConnectionHandle,
    scanner: NetworkScanner<C, I>,
    events: broadcast::Sender<ReaderEvent>,
}

impl ReaderService {
    /// Service on real TCP sockets and the host's interfaces.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ReaderConfig) -> ServiceResult<Self> {
        Self::with_transport(config, TcpConnector, SystemInterfaces)
    }

    /// Load `path` (defaults when missing) and keep it updated.
    pub fn open(path: impl Into<PathBuf>) -> ServiceResult<Self> {
        let path = path.into();
        let config = ReaderConfig::load_or_default(&path)?;
        Ok(Self::new(config)?.persist_to(path))
    }
}

impl<C: Connector + Clone, I: InterfaceSource> ReaderService<C, I> {
    /// Service over an explicit connector and interface source.
    ///
    /// # Errors
    /// Returns `ServiceError::Core` when `config` does not validate.
    pub fn with_transport(config: ReaderConfig, connector: C, interfaces: I) -> ServiceResult<Self> {
        config.validate()?;

        let connection = ConnectionManager::new(config.connection_config(), connector.clone()).start();
        let events = connection.event_sender();
        let scanner = NetworkScanner::new(connector, interfaces, config.scan_config());

        Ok(Self {
            config: RwLock::new(config),
            config_path: None,
            connection,
            scanner,
            events,
        })
    }

    /// Save the config to `path` whenever the reader address changes.
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub async fn config(&self) -> ReaderConfig {
        self.config.read().await.clone()
    }

    /// Store the reader address without connecting.
    pub async fn set_config(&self, ip: &str, port: u16) -> ServiceResult<ReaderAddress> {
        let address = ReaderAddress::parse(ip, port)?;
        self.remember(address).await?;
        info!(%address, "reader address configured");
        Ok(address)
    }

    /// Connect to `ip:port`, falling back to the configured values.
    ///
    /// The address becomes the last known one. Returns once the manager has
    /// accepted the request; the outcome arrives as `status-changed`.
    ///
    /// # Errors
    /// `Error::MissingConfig` when no IP is given or configured,
    /// `Error::InvalidAddress`/`InvalidPort` for bad input.
    pub async fn connect(&self, ip: Option<&str>, port: Option<u16>) -> ServiceResult<ReaderAddress> {
        let address = {
            let config = self.config.read().await;
            let port = port.unwrap_or(config.port);
            match ip {
                Some(ip) => ReaderAddress::parse(ip, port)?,
                None => {
                    let ip = config
                        .ip
                        .ok_or_else(|| Error::MissingConfig("ip".into()))?;
                    ReaderAddress::new(ip, port)?
                }
            }
        };

        self.remember(address).await?;
        self.connection.connect(address).await?;
        Ok(address)
    }

    pub async fn disconnect(&self) -> ServiceResult<()> {
        Ok(self.connection.disconnect().await?)
    }

    pub async fn start_inventory(&self) -> ServiceResult<()> {
        Ok(self.connection.start_inventory().await?)
    }

    pub async fn stop_inventory(&self) -> ServiceResult<()> {
        Ok(self.connection.stop_inventory().await?)
    }

    pub async fn status(&self) -> ServiceResult<ConnectionStatus> {
        Ok(self.connection.status().await?)
    }

    pub async fn tags(&self) -> ServiceResult<Vec<TagRead>> {
        Ok(self.connection.tags().await?)
    }

    pub async fn clear_tags(&self) -> ServiceResult<()> {
        Ok(self.connection.clear_tags().await?)
    }

    /// Look for a reader, starting from the last known IP.
    ///
    /// Progress is published as `scan-progress` events. A found reader
    /// becomes the configured address but is not connected.
    pub async fn scan_network(&self) -> ScanOutcome {
        let last_known = self.config.read().await.ip;
        let events = &self.events;

        let outcome = self
            .scanner
            .scan(last_known, &|progress| {
                let _ = events.send(ReaderEvent::ScanProgress(progress));
            })
            .await;

        if let ScanOutcome::Found { address } = outcome
            && let Err(e) = self.remember(address).await
        {
            warn!(%address, error = %e, "could not save discovered reader address");
        }
        outcome
    }

    /// Scan, then connect to whatever was found.
    pub async fn auto_connect(&self) -> ServiceResult<ScanOutcome> {
        let outcome = self.scan_network().await;
        if let Some(address) = outcome.address() {
            info!(%address, "auto-connecting");
            self.connection.connect(address).await?;
        }
        Ok(outcome)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    /// Disconnect and stop the connection manager.
    pub async fn shutdown(&self) -> ServiceResult<()> {
        Ok(self.connection.shutdown().await?)
    }

    async fn remember(&self, address: ReaderAddress) -> ServiceResult<()> {
        let mut config = self.config.write().await;
        config.ip = Some(address.ip);
        config.port = address.port;
        if let Some(path) = &self.config_path {
            config.save(path)?;
        }
        Ok(())
    }
}
