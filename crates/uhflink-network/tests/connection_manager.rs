//! Integration tests for the connection manager state machine.
//!
//! Time is paused: timers (settle, heartbeat, poll, health check, reconnect)
//! fire as soon as every task is idle, so multi-second scenarios run
//! instantly and elapsed times are exact.

mod common;

use common::{PipeConnector, inventory_payload, wait_for_state, wait_for_status, wait_for_tag};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{Instant, sleep};
use tokio_util::codec::Framed;
use uhflink_core::{ConnectionState, ReaderAddress};
use uhflink_network::{ConnectionConfig, ConnectionHandle, ConnectionManager, NetworkError};
use uhflink_protocol::{CmCodec, CommandCode, Frame};

fn reader_addr() -> ReaderAddress {
    "192.168.1.155:20058".parse().unwrap()
}

fn start(connector: PipeConnector) -> ConnectionHandle {
    ConnectionManager::new(ConnectionConfig::default(), connector).start()
}

/// Read frames until one with `command` arrives.
async fn next_command(
    reader: &mut Framed<tokio::io::DuplexStream, CmCodec>,
    command: CommandCode,
) -> Frame {
    loop {
        let frame = reader.next().await.unwrap().unwrap();
        if frame.command_code() == Some(command) {
            return frame;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_connect_schedules_single_reconnect() {
    let (connector, _servers) = PipeConnector::new();
    connector.refuse(true);
    let attempts = connector.attempts();
    let handle = start(connector);

    handle.connect(reader_addr()).await.unwrap();

    sleep(Duration::from_millis(100)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    let status = handle.status().await.unwrap();
    assert_eq!(status.state, ConnectionState::Reconnecting);
    assert!(!status.connected);
    assert!(!status.inventory_active);

    sleep(Duration::from_millis(350)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_reconnect() {
    let (connector, _servers) = PipeConnector::new();
    connector.refuse(true);
    let attempts = connector.attempts();
    let handle = start(connector);

    handle.connect(reader_addr()).await.unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(handle.status().await.unwrap().state, ConnectionState::Reconnecting);

    handle.disconnect().await.unwrap();
    sleep(Duration::from_secs(5)).await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(handle.status().await.unwrap().state, ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_clean_inventory_session() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();
    let started = Instant::now();

    handle.connect(reader_addr()).await.unwrap();
    let mut reader = Framed::new(servers.recv().await.unwrap(), CmCodec::new());

    let status = wait_for_state(&mut events, ConnectionState::Connected).await;
    assert!(status.connected);
    assert!(status.inventory_active);
    assert_eq!(status.ip, Some("192.168.1.155".parse().unwrap()));
    assert_eq!(status.port, Some(20058));

    let first = reader.next().await.unwrap().unwrap();
    assert_eq!(first.command_code(), Some(CommandCode::StartAutoRead));
    assert_eq!(started.elapsed(), Duration::from_millis(500));

    reader
        .send(Frame::new(CommandCode::StartInventory.as_u8(), 0x00, inventory_payload()).unwrap())
        .await
        .unwrap();

    let tag = wait_for_tag(&mut events).await;
    assert_eq!(tag.epc, "E200001122334455667788");
    assert_eq!(tag.antenna, 1);
    assert_eq!(tag.rssi, -56);

    let tags = handle.tags().await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].epc, "E200001122334455667788");
    assert_eq!(tags[0].count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_sightings_are_counted() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let mut reader = Framed::new(servers.recv().await.unwrap(), CmCodec::new());
    wait_for_state(&mut events, ConnectionState::Connected).await;

    for code in [CommandCode::StartAutoRead, CommandCode::Vendor22, CommandCode::StartInventory] {
        reader
            .send(Frame::new(code.as_u8(), 0x00, inventory_payload()).unwrap())
            .await
            .unwrap();
        wait_for_tag(&mut events).await;
    }

    let tags = handle.tags().await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].count, 3);
    assert!(tags[0].last_seen_at >= tags[0].first_seen_at);
}

#[tokio::test(start_paused = true)]
async fn test_reader_heartbeat_is_echoed() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let mut reader = Framed::new(servers.recv().await.unwrap(), CmCodec::new());
    wait_for_state(&mut events, ConnectionState::Connected).await;

    let sent_at = Instant::now();
    reader
        .send(Frame::request(CommandCode::Heartbeat))
        .await
        .unwrap();

    let echo = next_command(&mut reader, CommandCode::Heartbeat).await;
    assert!(echo.payload().is_empty());
    // Well before the periodic heartbeat would be due.
    assert!(sent_at.elapsed() < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_replies_are_not_echoed() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let mut reader = Framed::new(servers.recv().await.unwrap(), CmCodec::new());
    wait_for_state(&mut events, ConnectionState::Connected).await;

    // A reader that answers every heartbeat it receives.
    let heartbeats = Arc::new(AtomicUsize::new(0));
    let seen = heartbeats.clone();
    let responder = tokio::spawn(async move {
        while let Some(Ok(frame)) = reader.next().await {
            if frame.is_heartbeat() {
                if seen.fetch_add(1, Ordering::SeqCst) >= 10 {
                    break;
                }
                reader
                    .send(Frame::request(CommandCode::Heartbeat))
                    .await
                    .unwrap();
            }
        }
        reader
    });

    sleep(Duration::from_millis(10_500)).await;

    // Only the periodic ones at 3s, 6s and 9s.
    assert_eq!(heartbeats.load(Ordering::SeqCst), 3);
    let status = handle.status().await.unwrap();
    assert_eq!(status.state, ConnectionState::Connected);
    assert!(!responder.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_periodic_heartbeat_and_poll() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();
    let started = Instant::now();

    handle.connect(reader_addr()).await.unwrap();
    let mut reader = Framed::new(servers.recv().await.unwrap(), CmCodec::new());
    wait_for_state(&mut events, ConnectionState::Connected).await;

    next_command(&mut reader, CommandCode::StartInventory).await;
    assert_eq!(started.elapsed(), Duration::from_secs(1));

    next_command(&mut reader, CommandCode::Heartbeat).await;
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_stale_connection_is_recycled() {
    let (connector, mut servers) = PipeConnector::new();
    let attempts = connector.attempts();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let _silent_reader = servers.recv().await.unwrap();
    wait_for_state(&mut events, ConnectionState::Connected).await;
    let connected_at = Instant::now();

    // Health checks at 5s intervals; the first one past 30s of silence closes.
    let status = wait_for_state(&mut events, ConnectionState::Reconnecting).await;
    assert_eq!(connected_at.elapsed(), Duration::from_secs(35));
    assert!(!status.inventory_active);

    let _second = servers.recv().await.unwrap();
    wait_for_state(&mut events, ConnectionState::Connected).await;
    assert_eq!(connected_at.elapsed(), Duration::from_millis(35_500));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_peer_close_triggers_reconnect() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let first = servers.recv().await.unwrap();
    wait_for_state(&mut events, ConnectionState::Connected).await;

    drop(first);
    wait_for_state(&mut events, ConnectionState::Reconnecting).await;
    let lost_at = Instant::now();

    assert!(servers.recv().await.is_some());
    wait_for_state(&mut events, ConnectionState::Connected).await;
    assert_eq!(lost_at.elapsed(), Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_tags_survive_reconnect() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let mut reader = Framed::new(servers.recv().await.unwrap(), CmCodec::new());
    wait_for_state(&mut events, ConnectionState::Connected).await;

    reader
        .send(Frame::new(CommandCode::StartInventory.as_u8(), 0x00, inventory_payload()).unwrap())
        .await
        .unwrap();
    wait_for_tag(&mut events).await;

    drop(reader);
    wait_for_state(&mut events, ConnectionState::Reconnecting).await;
    let _second = servers.recv().await.unwrap();
    wait_for_state(&mut events, ConnectionState::Connected).await;
    // Past the post-connect commands and the first poll.
    sleep(Duration::from_secs(2)).await;

    let tags = handle.tags().await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].epc, "E200001122334455667788");
    assert_eq!(tags[0].count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_socket() {
    let (connector, mut servers) = PipeConnector::new();
    let attempts = connector.attempts();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let mut server = servers.recv().await.unwrap();
    wait_for_state(&mut events, ConnectionState::Connected).await;

    handle.disconnect().await.unwrap();
    let status = wait_for_state(&mut events, ConnectionState::Disconnected).await;
    assert!(!status.connected);
    assert!(!status.inventory_active);

    // Drain whatever was written before the close, then expect EOF.
    let mut sink = Vec::new();
    server.read_to_end(&mut sink).await.unwrap();

    sleep(Duration::from_secs(10)).await;
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_inventory_commands() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();

    assert!(matches!(
        handle.start_inventory().await,
        Err(NetworkError::NotConnected)
    ));

    handle.connect(reader_addr()).await.unwrap();
    let mut reader = Framed::new(servers.recv().await.unwrap(), CmCodec::new());
    wait_for_state(&mut events, ConnectionState::Connected).await;

    reader
        .send(Frame::new(0x2A, 0x00, inventory_payload()).unwrap())
        .await
        .unwrap();
    wait_for_tag(&mut events).await;

    handle.stop_inventory().await.unwrap();
    next_command(&mut reader, CommandCode::StopInventory).await;
    assert!(!handle.status().await.unwrap().inventory_active);
    assert_eq!(handle.tags().await.unwrap().len(), 1);

    handle.start_inventory().await.unwrap();
    next_command(&mut reader, CommandCode::StartInventory).await;
    let status = handle.status().await.unwrap();
    assert!(status.inventory_active);
    assert!(handle.tags().await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clear_tags_keeps_connection() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let mut reader = Framed::new(servers.recv().await.unwrap(), CmCodec::new());
    wait_for_state(&mut events, ConnectionState::Connected).await;

    reader
        .send(Frame::new(0x81, 0x00, inventory_payload()).unwrap())
        .await
        .unwrap();
    wait_for_tag(&mut events).await;

    handle.clear_tags().await.unwrap();
    assert!(handle.tags().await.unwrap().is_empty());
    assert!(handle.status().await.unwrap().connected);
}

#[tokio::test(start_paused = true)]
async fn test_firmware_version_reported() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let mut reader = Framed::new(servers.recv().await.unwrap(), CmCodec::new());
    wait_for_state(&mut events, ConnectionState::Connected).await;

    next_command(&mut reader, CommandCode::GetVersion).await;
    reader
        .send(Frame::new(0x31, 0x00, b"CM-R2000 V2.4\0".to_vec()).unwrap())
        .await
        .unwrap();

    let status = wait_for_status(&mut events, |s| s.firmware_version.is_some()).await;
    assert_eq!(status.firmware_version.as_deref(), Some("CM-R2000 V2.4"));
}

#[tokio::test(start_paused = true)]
async fn test_garbage_and_malformed_payloads_are_dropped() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let server = servers.recv().await.unwrap();
    wait_for_state(&mut events, ConnectionState::Connected).await;

    let mut reader = Framed::new(server, CmCodec::new());
    // Too short to hold a tag, then a valid one.
    reader
        .send(Frame::new(0x2A, 0x00, vec![0x01, 0x30]).unwrap())
        .await
        .unwrap();
    reader
        .get_mut()
        .write_all(b"\xFF\x00noise")
        .await
        .unwrap();
    reader
        .send(Frame::new(0x2A, 0x00, inventory_payload()).unwrap())
        .await
        .unwrap();

    let tag = wait_for_tag(&mut events).await;
    assert_eq!(tag.epc, "E200001122334455667788");
    assert_eq!(handle.tags().await.unwrap().len(), 1);
    assert!(handle.status().await.unwrap().connected);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_to_new_address_replaces_socket() {
    let (connector, mut servers) = PipeConnector::new();
    let handle = start(connector);
    let mut events = handle.subscribe();

    handle.connect(reader_addr()).await.unwrap();
    let mut first = servers.recv().await.unwrap();
    wait_for_state(&mut events, ConnectionState::Connected).await;

    let other: ReaderAddress = "192.168.1.156:4001".parse().unwrap();
    handle.connect(other).await.unwrap();
    let _second = servers.recv().await.unwrap();

    let status = wait_for_status(&mut events, |s| s.connected && s.port == Some(4001)).await;
    assert_eq!(status.address(), Some(other));

    let mut sink = Vec::new();
    first.read_to_end(&mut sink).await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_manager() {
    let (connector, _servers) = PipeConnector::new();
    let handle = start(connector);

    handle.shutdown().await.unwrap();
    assert!(matches!(
        handle.status().await,
        Err(NetworkError::ManagerStopped)
    ));
}
