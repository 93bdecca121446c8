//! MemoryLink Tests

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use cproto::transport::{LinkAddress, MemoryNetwork, ProtocolId};
use cproto::{CpError, Transport};

fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

#[test]
fn test_send_and_receive() {
    let network = MemoryNetwork::new();
    let a = network.bind(addr(1)).unwrap();
    let b = network.bind(addr(2)).unwrap();

    a.send("cp cookie_request", &LinkAddress::cp(addr(2))).unwrap();

    let datagram = b.receive(Duration::from_millis(100)).unwrap().unwrap();
    assert_eq!(datagram.payload, "cp cookie_request");
    assert_eq!(datagram.source, LinkAddress::cp(addr(1)));
    assert_eq!(datagram.protocol(), ProtocolId::Cp);
}

#[test]
fn test_protocol_id_travels_with_frame() {
    let network = MemoryNetwork::new();
    let a = network.bind(addr(1)).unwrap();
    let b = network.bind(addr(2)).unwrap();

    a.send("hello", &LinkAddress::new(addr(2), ProtocolId::App)).unwrap();

    let datagram = b.receive(Duration::from_millis(100)).unwrap().unwrap();
    assert_eq!(datagram.protocol(), ProtocolId::App);
}

#[test]
fn test_receive_times_out() {
    let network = MemoryNetwork::new();
    let a = network.bind(addr(1)).unwrap();

    let started = Instant::now();
    assert!(a.receive(Duration::from_millis(50)).unwrap().is_none());
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[test]
fn test_unknown_destination_is_dropped() {
    let network = MemoryNetwork::new();
    let a = network.bind(addr(1)).unwrap();

    assert!(a.send("lost", &LinkAddress::cp(addr(99))).is_ok());
}

#[test]
fn test_double_bind_rejected() {
    let network = MemoryNetwork::new();
    let _a = network.bind(addr(1)).unwrap();

    assert!(matches!(network.bind(addr(1)), Err(CpError::Transport(_))));
}

#[test]
fn test_drop_releases_address() {
    let network = MemoryNetwork::new();
    let a = network.bind(addr(1)).unwrap();
    drop(a);

    assert!(network.bind(addr(1)).is_ok());
}

#[test]
fn test_pending_and_drain() {
    let network = MemoryNetwork::new();
    let a = network.bind(addr(1)).unwrap();
    let b = network.bind(addr(2)).unwrap();

    for i in 0..3 {
        a.send(&format!("frame {}", i), &LinkAddress::cp(addr(2))).unwrap();
    }

    assert_eq!(b.pending(), 3);
    let frames: Vec<String> = b.drain().into_iter().map(|d| d.payload).collect();
    assert_eq!(frames, vec!["frame 0", "frame 1", "frame 2"]);
    assert_eq!(b.pending(), 0);
}
