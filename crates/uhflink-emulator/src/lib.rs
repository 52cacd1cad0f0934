//! Software stand-in for a CM protocol UHF reader.
//!
//! The emulator listens on TCP and behaves like a reader on the bench:
//! it answers heartbeats, inventory requests and version queries, streams
//! tag reports in auto-read mode and sends its own periodic heartbeat.
//! It backs the end-to-end tests and the `simulate` CLI command.
//!
//! ```no_run
//! use uhflink_emulator::{EmulatedTag, EmulatorConfig, ReaderEmulator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EmulatorConfig {
//!     bind_addr: "127.0.0.1:20058".parse()?,
//!     tags: vec![EmulatedTag::from_hex("E20000112233445566778899", 1, -48)?],
//!     ..Default::default()
//! };
//! let emulator = ReaderEmulator::bind(config).await?.spawn();
//! println!("reader emulator on {}", emulator.local_addr());
//! # Ok(())
//! # }
//! ```

mod config;
mod server;

pub use config::{EmulatedTag, EmulatorConfig};
pub use server::{EmulatorError, EmulatorHandle, ReaderEmulator};
