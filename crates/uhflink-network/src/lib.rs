//! Network layer for UHF readers speaking the CM protocol.
//!
//! # Components
//!
//! - [`ConnectionManager`]: actor owning the single reader socket; keeps it
//!   alive with heartbeats, polls inventory, reconnects on loss and turns
//!   inventory frames into deduplicated tag reads
//! - [`NetworkScanner`]: tiered active discovery of a reader on the local
//!   subnets
//! - [`Connector`]: seam between both of the above and the transport
//!
//! # Example
//!
//! ```no_run
//! use uhflink_network::{ConnectionConfig, ConnectionManager, TcpConnector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = ConnectionManager::new(ConnectionConfig::default(), TcpConnector).start();
//! let mut events = handle.subscribe();
//!
//! handle.connect("192.168.1.155:20058".parse()?).await?;
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod connector;
mod error;
mod interfaces;
mod manager;
mod probe;
mod scanner;
mod session;

pub use connector::{Connector, TcpConnector};
pub use error::{NetworkError, NetworkResult};
pub use interfaces::{InterfaceSource, StaticInterfaces, Subnet, SystemInterfaces, subnets_of};
pub use manager::{ConnectionConfig, ConnectionHandle, ConnectionManager};
pub use probe::{connect_only, verify_handshake};
pub use scanner::{NetworkScanner, ProgressFn, ScanConfig};
