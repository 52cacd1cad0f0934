//! End-to-end tests over real loopback sockets.

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use uhflink_emulator::{EmulatedTag, EmulatorConfig, EmulatorHandle, ReaderEmulator};
use uhflink_protocol::{CmCodec, CommandCode, Frame, extract_tag_read};

const WAIT: Duration = Duration::from_secs(2);

async fn start(config: EmulatorConfig) -> EmulatorHandle {
    let config = EmulatorConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..config
    };
    ReaderEmulator::bind(config).await.unwrap().spawn()
}

async fn connect(handle: &EmulatorHandle) -> Framed<TcpStream, CmCodec> {
    let stream = TcpStream::connect(handle.local_addr()).await.unwrap();
    Framed::new(stream, CmCodec::new())
}

async fn next_frame(framed: &mut Framed<TcpStream, CmCodec>) -> Frame {
    timeout(WAIT, framed.next())
        .await
        .expect("no frame in time")
        .expect("stream closed")
        .unwrap()
}

fn one_tag() -> Vec<EmulatedTag> {
    vec![EmulatedTag::from_hex("E20000112233445566778899", 1, -48).unwrap()]
}

#[tokio::test]
async fn test_answers_heartbeat_and_version() {
    let handle = start(EmulatorConfig {
        firmware_version: "CM-R2000 V2.4".into(),
        ..Default::default()
    })
    .await;
    let mut framed = connect(&handle).await;

    framed.send(Frame::request(CommandCode::Heartbeat)).await.unwrap();
    assert!(next_frame(&mut framed).await.is_heartbeat());

    framed.send(Frame::request(CommandCode::GetVersion)).await.unwrap();
    let version = next_frame(&mut framed).await;
    assert_eq!(version.command_code(), Some(CommandCode::GetVersion));
    assert_eq!(version.payload(), b"CM-R2000 V2.4");
}

#[tokio::test]
async fn test_inventory_request_reports_tags() {
    let handle = start(EmulatorConfig {
        tags: one_tag(),
        ..Default::default()
    })
    .await;
    let mut framed = connect(&handle).await;

    framed
        .send(Frame::request(CommandCode::StartInventory))
        .await
        .unwrap();
    let frame = next_frame(&mut framed).await;

    assert!(frame.is_inventory_response());
    let tag = extract_tag_read(frame.payload()).unwrap();
    assert_eq!(tag.epc, "E20000112233445566778899");
    assert_eq!(tag.rssi, -48);
}

#[tokio::test]
async fn test_auto_read_streams_reports() {
    let handle = start(EmulatorConfig {
        tags: one_tag(),
        report_interval: Duration::from_millis(50),
        ..Default::default()
    })
    .await;
    let mut framed = connect(&handle).await;

    framed
        .send(Frame::request(CommandCode::StartAutoRead))
        .await
        .unwrap();

    for _ in 0..3 {
        let frame = next_frame(&mut framed).await;
        assert_eq!(frame.command_code(), Some(CommandCode::StartAutoRead));
    }
}

#[tokio::test]
async fn test_reader_sends_own_heartbeat() {
    let handle = start(EmulatorConfig {
        heartbeat_interval: Duration::from_millis(50),
        ..Default::default()
    })
    .await;
    let mut framed = connect(&handle).await;

    assert!(next_frame(&mut framed).await.is_heartbeat());

    // Echo is absorbed, not bounced back
    framed.send(Frame::request(CommandCode::Heartbeat)).await.unwrap();
    let next = next_frame(&mut framed).await;
    assert!(next.is_heartbeat());
}

#[tokio::test]
async fn test_shutdown_closes_listener_and_connections() {
    let handle = start(EmulatorConfig::default()).await;
    let addr = handle.local_addr();
    let mut framed = connect(&handle).await;

    handle.shutdown().await;

    let closed = timeout(WAIT, framed.next()).await.unwrap();
    assert!(closed.is_none() || closed.unwrap().is_err());
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_rejects_zero_interval() {
    let config = EmulatorConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        report_interval: Duration::ZERO,
        ..Default::default()
    };
    assert!(ReaderEmulator::bind(config).await.is_err());
}
