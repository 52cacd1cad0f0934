//! Tiered active discovery of a CM reader on the local network.
//!
//! Tiers run in order and the scan stops at the first endpoint that passes
//! the protocol handshake:
//!
//! 1. **Fast path**: the last known reader IP on each priority port
//! 2. **Subnet sweep**: for every local /24, connect-only probes on the
//!    priority ports in batches (phase A), then a handshake on each open
//!    port (phase B)
//! 3. **Deep fallback**: the same sweep over the remaining common RFID and
//!    industrial ports
//!
//! Every probe and handshake has its own timeout, so a scan always ends.

use futures::future::join_all;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, info, warn};
use uhflink_core::{
    ReaderAddress, ScanCandidate, ScanOutcome, ScanProgress, ScanStatus,
    constants::{
        DEEP_SCAN_PORTS, DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_SCAN_BATCH_SIZE,
        DEFAULT_VERIFY_TIMEOUT_MS, PRIORITY_PORTS,
    },
};

use crate::connector::Connector;
use crate::interfaces::{InterfaceSource, Subnet, subnets_of};
use crate::probe::{connect_only, verify_handshake};

/// Ports and timeouts of a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Ports tried on the fast path and in phase A, in order.
    pub priority_ports: Vec<u16>,

    /// Ports tried by the deep fallback; priority ports are skipped.
    pub deep_ports: Vec<u16>,

    /// Handshake timeout per endpoint.
    pub verify_timeout: Duration,

    /// Connect-only probe timeout per endpoint.
    pub probe_timeout: Duration,

    /// Concurrent connect-only probes.
    pub batch_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            priority_ports: PRIORITY_PORTS.to_vec(),
            deep_ports: DEEP_SCAN_PORTS.to_vec(),
            verify_timeout: Duration::from_millis(DEFAULT_VERIFY_TIMEOUT_MS),
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            batch_size: DEFAULT_SCAN_BATCH_SIZE,
        }
    }
}

/// Progress sink called synchronously from the scan.
pub type ProgressFn<'a> = &'a (dyn Fn(ScanProgress) + Send + Sync);

/// Active reader discovery.
///
/// Uses throwaway sockets only; it never touches a connection manager, so it
/// can run while one is connecting.
///
/// # Example
///
/// ```no_run
/// use uhflink_network::{NetworkScanner, ScanConfig, SystemInterfaces, TcpConnector};
///
/// # async fn example() {
/// let scanner = NetworkScanner::new(TcpConnector, SystemInterfaces, ScanConfig::default());
/// let outcome = scanner
///     .scan(None, &|progress| println!("{:?}: {}", progress.status, progress.message))
///     .await;
/// println!("{outcome:?}");
/// # }
/// ```
pub struct NetworkScanner<C, I> {
    connector: C,
    interfaces: I,
    config: ScanConfig,
}

impl<C: Connector, I: InterfaceSource> NetworkScanner<C, I> {
    pub fn new(connector: C, interfaces: I, config: ScanConfig) -> Self {
        Self {
            connector,
            interfaces,
            config,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Look for a reader, trying `last_known` first.
    ///
    /// Publishes `scanning`, `trying`, `verifying`, and finally `found` or
    /// `not_found` through `progress`.
    pub async fn scan(&self, last_known: Option<IpAddr>, progress: ProgressFn<'_>) -> ScanOutcome {
        if let Some(ip) = last_known {
            progress(ScanProgress::new(
                ScanStatus::Scanning,
                format!("Checking last known reader at {ip}"),
            ));
            let fast_path: Vec<ReaderAddress> = self
                .config
                .priority_ports
                .iter()
                .filter_map(|&port| ReaderAddress::new(ip, port).ok())
                .collect();
            if let Some(found) = self.verify_each(&fast_path, progress).await {
                return found;
            }
        }

        let subnets = self.subnets(last_known);
        progress(ScanProgress::new(
            ScanStatus::Scanning,
            format!("Scanning {} subnet(s)", subnets.len()),
        ));

        for subnet in &subnets {
            progress(ScanProgress::new(
                ScanStatus::Trying,
                format!("Probing {subnet} on priority ports"),
            ));
            let targets = targets(*subnet, &self.config.priority_ports);
            let open = self.probe_batch(&targets).await;
            debug!(%subnet, open = open.len(), "priority sweep done");

            if let Some(found) = self.verify_each(&open, progress).await {
                return found;
            }
        }

        let deep_ports: Vec<u16> = self
            .config
            .deep_ports
            .iter()
            .copied()
            .filter(|port| !self.config.priority_ports.contains(port))
            .collect();

        if !deep_ports.is_empty() {
            for subnet in &subnets {
                progress(ScanProgress::new(
                    ScanStatus::Trying,
                    format!("Deep scan of {subnet} on {} port(s)", deep_ports.len()),
                ));
                let open = self.probe_batch(&targets(*subnet, &deep_ports)).await;
                debug!(%subnet, open = open.len(), "deep sweep done");

                if let Some(found) = self.verify_each(&open, progress).await {
                    return found;
                }
            }
        }

        info!("no reader found");
        progress(ScanProgress::new(ScanStatus::NotFound, "No reader found"));
        ScanOutcome::NotFound
    }

    /// Interface subnets, plus the last known IP's subnet when none covers it.
    fn subnets(&self, last_known: Option<IpAddr>) -> Vec<Subnet> {
        let addrs = self.interfaces.ipv4_addresses().unwrap_or_else(|e| {
            warn!(error = %e, "could not enumerate interfaces");
            Vec::new()
        });
        let mut subnets = subnets_of(&addrs);

        if let Some(IpAddr::V4(ip)) = last_known {
            let known = subnets.iter().any(|subnet| subnet.contains(IpAddr::V4(ip)));
            if !ip.is_loopback() && !known {
                subnets.push(Subnet::of(ip));
            }
        }
        subnets
    }

    /// Handshake with each address in turn; the first success ends the scan.
    async fn verify_each(
        &self,
        candidates: &[ReaderAddress],
        progress: ProgressFn<'_>,
    ) -> Option<ScanOutcome> {
        for &addr in candidates {
            progress(
                ScanProgress::new(ScanStatus::Verifying, format!("Verifying {addr}")).at(addr),
            );
            let candidate = self.verify(addr).await;
            if candidate.verified {
                info!(%addr, "reader found");
                progress(
                    ScanProgress::new(ScanStatus::Found, format!("Reader found at {addr}")).at(addr),
                );
                return Some(ScanOutcome::Found { address: addr });
            }
            if let Some(reason) = &candidate.reason {
                debug!(%addr, %reason, "candidate rejected");
            }
        }
        None
    }

    async fn verify(&self, addr: ReaderAddress) -> ScanCandidate {
        match verify_handshake(&self.connector, addr.socket_addr(), self.config.verify_timeout).await {
            Ok(()) => ScanCandidate::verified(addr),
            Err(reason) => ScanCandidate::rejected(addr, reason),
        }
    }

    /// Connect-only probes, `batch_size` at a time; returns the open ones in
    /// target order.
    async fn probe_batch(&self, targets: &[ReaderAddress]) -> Vec<ReaderAddress> {
        let mut open = Vec::new();
        for chunk in targets.chunks(self.config.batch_size.max(1)) {
            let results = join_all(chunk.iter().map(|addr| {
                connect_only(&self.connector, addr.socket_addr(), self.config.probe_timeout)
            }))
            .await;
            open.extend(
                chunk
                    .iter()
                    .zip(results)
                    .filter_map(|(addr, is_open)| is_open.then_some(*addr)),
            );
        }
        open
    }
}

/// Every host 0-255 of `subnet` on each of `ports`, host-major.
fn targets(subnet: Subnet, ports: &[u16]) -> Vec<ReaderAddress> {
    (0..=u8::MAX)
        .flat_map(|host| {
            ports.iter().filter_map(move |&port| {
                ReaderAddress::new(IpAddr::V4(subnet.host(host)), port).ok()
            })
        })
        .collect()
}
