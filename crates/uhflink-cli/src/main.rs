//! `uhflink` operator binary.
//!
//! Events are written to stdout as JSON lines; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uhflink_core::ReaderEvent;
use uhflink_emulator::{EmulatedTag, EmulatorConfig, ReaderEmulator};
use uhflink_service::ReaderService;

/// Antenna and signal reported for every simulated tag.
const SIMULATED_ANTENNA: u8 = 1;
const SIMULATED_RSSI: i8 = -50;

#[derive(Debug, Parser)]
#[command(name = "uhflink", author, version, about = "UHF RFID reader link")]
struct Cli {
    /// Log filter (trace, debug, info, warn, error or a RUST_LOG directive)
    #[arg(short, long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Reader config file; updated with the last reader address
    #[arg(short, long, default_value = "uhflink.json", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connect to a reader and stream its events
    Connect {
        /// Reader IP; defaults to the configured one
        ip: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Search the local network for a reader
    Scan,

    /// Scan, connect to the reader found and stream its events
    Auto,

    /// Run a reader emulator
    Simulate {
        #[arg(short, long, default_value = "0.0.0.0:20058")]
        bind: SocketAddr,

        /// EPC in hex; repeat for several tags
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        #[arg(long)]
        firmware: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Connect { ip, port } => {
            let service = open_service(&cli.config)?;
            let events = service.subscribe();
            let address = service.connect(ip.as_deref(), port).await?;
            info!(%address, "connecting");
            stream_events(&service, events).await
        }
        Command::Scan => {
            let service = open_service(&cli.config)?;
            let mut events = service.subscribe();
            let outcome = with_events(service.scan_network(), &mut events).await?;
            print_json(&outcome)?;
            service.shutdown().await?;
            Ok(())
        }
        Command::Auto => {
            let service = open_service(&cli.config)?;
            let mut events = service.subscribe();
            let outcome = with_events(service.auto_connect(), &mut events).await??;
            if outcome.address().is_none() {
                service.shutdown().await?;
                anyhow::bail!("no reader found");
            }
            stream_events(&service, events).await
        }
        Command::Simulate {
            bind,
            tags,
            firmware,
        } => simulate(bind, &tags, firmware).await,
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_service(path: &Path) -> Result<ReaderService> {
    ReaderService::open(path).with_context(|| format!("loading {}", path.display()))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Print events while `task` runs, then whatever it left queued.
async fn with_events<F: Future>(
    task: F,
    events: &mut broadcast::Receiver<ReaderEvent>,
) -> Result<F::Output> {
    tokio::pin!(task);
    let output = loop {
        tokio::select! {
            output = &mut task => break output,
            event = events.recv() => match event {
                Ok(event) => print_json(&event)?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break task.await,
            },
        }
    };

    loop {
        match events.try_recv() {
            Ok(event) => print_json(&event)?,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    Ok(output)
}

/// Print events until Ctrl-C, then shut the service down.
async fn stream_events(
    service: &ReaderService,
    mut events: broadcast::Receiver<ReaderEvent>,
) -> Result<()> {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => print_json(&event)?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }
    service.shutdown().await?;
    Ok(())
}

async fn simulate(bind: SocketAddr, tags: &[String], firmware: Option<String>) -> Result<()> {
    let tags = tags
        .iter()
        .map(|epc| EmulatedTag::from_hex(epc, SIMULATED_ANTENNA, SIMULATED_RSSI))
        .collect::<uhflink_core::Result<Vec<_>>>()?;

    let mut config = EmulatorConfig {
        bind_addr: bind,
        tags,
        ..Default::default()
    };
    if let Some(firmware) = firmware {
        config.firmware_version = firmware;
    }

    let emulator = ReaderEmulator::bind(config).await?.spawn();
    info!(addr = %emulator.local_addr(), "simulating reader, Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    emulator.shutdown().await;
    Ok(())
}
