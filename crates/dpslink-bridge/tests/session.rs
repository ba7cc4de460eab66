//! End-to-end bridge sessions over real TCP connections.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use dpslink_bridge::{AcceptOutcome, Bridge, BridgeConfig, QueryPolicy};
use dpslink_transport::{BridgeListener, DeviceChannel, TcpEndpoint};

/// Device that echoes every frame it is sent, byte by byte.
#[derive(Default)]
struct EchoDevice {
    pending: VecDeque<u8>,
}

impl DeviceChannel for EchoDevice {
    fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.pending.extend(frame.iter().copied());
        Ok(())
    }

    fn recv_byte(&mut self) -> std::io::Result<Option<u8>> {
        Ok(self.pending.pop_front())
    }
}

/// Device that swallows frames and never responds.
#[derive(Default)]
struct SilentDevice;

impl DeviceChannel for SilentDevice {
    fn send(&mut self, _frame: &[u8]) -> std::io::Result<()> {
        Ok(())
    }

    fn recv_byte(&mut self) -> std::io::Result<Option<u8>> {
        Ok(None)
    }
}

fn test_config() -> BridgeConfig {
    BridgeConfig {
        max_clients: 4,
        max_frame: 64,
        response_timeout: Duration::from_secs(2),
        query_policy: QueryPolicy::Log,
    }
}

fn bind_listener() -> BridgeListener {
    BridgeListener::bind("127.0.0.1:0".parse().unwrap()).expect("listener should bind")
}

fn connect(listener: &BridgeListener) -> TcpStream {
    let stream = TcpStream::connect(listener.local_addr()).expect("client should connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(3)))
        .expect("read timeout should apply");
    stream
}

fn pump_accept<D: DeviceChannel>(
    listener: &BridgeListener,
    bridge: &mut Bridge<D, TcpEndpoint>,
) -> Option<AcceptOutcome> {
    let start = Instant::now();
    loop {
        if let Some(conn) = listener.try_accept().expect("accept should not fail") {
            return Some(bridge.accept(conn));
        }
        if start.elapsed() > Duration::from_secs(2) {
            return None;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn drive<D: DeviceChannel>(bridge: &mut Bridge<D, TcpEndpoint>, for_at_least: Duration) {
    let start = Instant::now();
    while start.elapsed() < for_at_least {
        bridge
            .poll_cycle(Instant::now())
            .expect("poll cycle should not fail");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn read_some(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = [0u8; 256];
    match stream.read(&mut buf) {
        Ok(n) => buf[..n].to_vec(),
        Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Vec::new(),
        Err(err) => panic!("client read failed: {err}"),
    }
}

#[test]
fn submitted_frame_is_echoed_back_to_the_submitter() {
    let listener = bind_listener();
    let mut bridge = Bridge::new(EchoDevice::default(), &test_config());

    let mut client = connect(&listener);
    assert_eq!(
        pump_accept(&listener, &mut bridge),
        Some(AcceptOutcome::Admitted(0))
    );

    client.write_all(&[0x7E, 0x01, 0x02, 0x7F]).unwrap();
    drive(&mut bridge, Duration::from_millis(100));

    assert_eq!(read_some(&mut client), vec![0x7E, 0x01, 0x02, 0x7F]);
    assert!(bridge.is_idle());
}

#[test]
fn garbage_before_the_frame_is_invisible_to_the_device() {
    let listener = bind_listener();
    let mut bridge = Bridge::new(EchoDevice::default(), &test_config());

    let mut client = connect(&listener);
    pump_accept(&listener, &mut bridge);

    client.write_all(&[0xFF, 0xFF, 0x7E, 0x01, 0x7F]).unwrap();
    drive(&mut bridge, Duration::from_millis(100));

    // The echo reflects exactly the frame, so the garbage never reached it.
    assert_eq!(read_some(&mut client), vec![0x7E, 0x01, 0x7F]);
}

#[test]
fn fifth_concurrent_client_is_told_busy_and_closed() {
    let listener = bind_listener();
    let mut bridge = Bridge::new(EchoDevice::default(), &test_config());

    let _kept: Vec<TcpStream> = (0..4usize)
        .map(|i| {
            let client = connect(&listener);
            assert_eq!(
                pump_accept(&listener, &mut bridge),
                Some(AcceptOutcome::Admitted(i))
            );
            client
        })
        .collect();

    let mut fifth = connect(&listener);
    assert_eq!(
        pump_accept(&listener, &mut bridge),
        Some(AcceptOutcome::Rejected)
    );
    assert_eq!(bridge.live_clients(), 4);

    let mut notice = Vec::new();
    fifth
        .read_to_end(&mut notice)
        .expect("rejected connection should be closed after the notice");
    assert_eq!(notice, b"busy");
}

#[test]
fn freed_slot_is_reusable_by_a_new_client() {
    let listener = bind_listener();
    let config = BridgeConfig {
        max_clients: 1,
        ..test_config()
    };
    let mut bridge = Bridge::new(EchoDevice::default(), &config);

    let first = connect(&listener);
    assert_eq!(
        pump_accept(&listener, &mut bridge),
        Some(AcceptOutcome::Admitted(0))
    );
    drop(first);

    // Give the bridge a moment to observe the disconnect.
    drive(&mut bridge, Duration::from_millis(50));

    let _second = connect(&listener);
    assert_eq!(
        pump_accept(&listener, &mut bridge),
        Some(AcceptOutcome::Admitted(0))
    );
    assert_eq!(bridge.live_clients(), 1);
}

#[test]
fn silent_device_reports_timeout_then_serves_the_next_client() {
    let listener = bind_listener();
    let config = BridgeConfig {
        response_timeout: Duration::from_millis(100),
        ..test_config()
    };
    let mut bridge = Bridge::new(SilentDevice, &config);

    let mut first = connect(&listener);
    let mut second = connect(&listener);
    pump_accept(&listener, &mut bridge);
    pump_accept(&listener, &mut bridge);

    first.write_all(&[0x7E, 0x01, 0x7F]).unwrap();
    drive(&mut bridge, Duration::from_millis(200));
    assert_eq!(read_some(&mut first), b"TIMEOUT");
    assert!(bridge.is_idle());

    second.write_all(&[0x7E, 0x02, 0x7F]).unwrap();
    drive(&mut bridge, Duration::from_millis(200));
    assert_eq!(read_some(&mut second), b"TIMEOUT");
}

#[test]
fn responses_go_only_to_the_requesting_client() {
    let listener = bind_listener();
    let mut bridge = Bridge::new(EchoDevice::default(), &test_config());

    let mut asker = connect(&listener);
    let mut bystander = connect(&listener);
    pump_accept(&listener, &mut bridge);
    pump_accept(&listener, &mut bridge);

    asker.write_all(&[0x7E, 0x55, 0x7F]).unwrap();
    drive(&mut bridge, Duration::from_millis(100));

    assert_eq!(read_some(&mut asker), vec![0x7E, 0x55, 0x7F]);
    bystander
        .set_read_timeout(Some(Duration::from_millis(50)))
        .unwrap();
    assert!(read_some(&mut bystander).is_empty());
}
