//! Server Tests
//!
//! Cookie server and command server request handling, driven one frame at a
//! time through `serve_once`.

use std::sync::Arc;
use std::time::Duration;

use cproto::protocol::{encode, Command, CommandResponse, CookieResponse, Message};
use cproto::session::SessionTable;
use cproto::transport::{LinkAddress, MemoryNetwork, ProtocolId};
use cproto::engine::{PAYLOAD_NOT_TRANSMITTABLE, RESPONSE_TOO_LARGE};
use cproto::{BuiltinHandler, Client, CommandOutcome, CommandServer, CookieServer, Transport};

use crate::support::*;

const POLL: Duration = Duration::from_millis(200);

// =============================================================================
// Cookie Server Tests
// =============================================================================

#[test]
fn test_cookie_server_grants_and_replies_to_source() {
    let network = MemoryNetwork::new();
    let sessions = default_sessions();
    let server = CookieServer::with_sessions(
        network.bind(addr(COOKIE_PORT)).unwrap(),
        Arc::clone(&sessions),
        &test_config(),
    );
    let peer = network.bind(addr(CLIENT_PORT)).unwrap();

    peer.send(&encode(&Message::CookieRequest), &LinkAddress::cp(addr(COOKIE_PORT)))
        .unwrap();
    assert!(server.serve_once(POLL).unwrap());

    let (message, source) = expect_message(&peer);
    let issued = sessions.lookup(&addr(CLIENT_PORT)).unwrap();
    assert_eq!(message, Message::CookieResponse(CookieResponse::Granted(issued.value)));
    assert_eq!(source, LinkAddress::cp(addr(COOKIE_PORT)));
}

#[test]
fn test_cookie_server_renews_for_same_peer() {
    let network = MemoryNetwork::new();
    let sessions = default_sessions();
    let server = CookieServer::with_sessions(
        network.bind(addr(COOKIE_PORT)).unwrap(),
        Arc::clone(&sessions),
        &test_config(),
    );
    let peer = network.bind(addr(CLIENT_PORT)).unwrap();
    let target = LinkAddress::cp(addr(COOKIE_PORT));

    for _ in 0..3 {
        peer.send(&encode(&Message::CookieRequest), &target).unwrap();
        server.serve_once(POLL).unwrap();
        expect_message(&peer);
    }

    assert_eq!(sessions.len(), 1);
}

#[test]
fn test_cookie_server_reports_full_table() {
    let network = MemoryNetwork::new();
    let sessions = Arc::new(SessionTable::new(2, 1_000_000));
    let server = CookieServer::with_sessions(
        network.bind(addr(COOKIE_PORT)).unwrap(),
        Arc::clone(&sessions),
        &test_config(),
    );
    let target = LinkAddress::cp(addr(COOKIE_PORT));

    let peers: Vec<_> = (0..3)
        .map(|i| network.bind(addr(CLIENT_PORT + i)).unwrap())
        .collect();

    for peer in &peers {
        peer.send(&encode(&Message::CookieRequest), &target).unwrap();
        server.serve_once(POLL).unwrap();
    }

    assert!(matches!(
        expect_message(&peers[0]).0,
        Message::CookieResponse(CookieResponse::Granted(_))
    ));
    assert!(matches!(
        expect_message(&peers[1]).0,
        Message::CookieResponse(CookieResponse::Granted(_))
    ));
    assert_eq!(
        expect_message(&peers[2]).0,
        Message::CookieResponse(CookieResponse::Rejected("cookie limit reached".to_string()))
    );
    assert_eq!(sessions.len(), 2);
}

#[test]
fn test_cookie_server_survives_malformed_frames() {
    let network = MemoryNetwork::new();
    let server = CookieServer::new(network.bind(addr(COOKIE_PORT)).unwrap(), &test_config())
        .unwrap();
    let peer = network.bind(addr(CLIENT_PORT)).unwrap();
    let target = LinkAddress::cp(addr(COOKIE_PORT));

    peer.send("garbage", &target).unwrap();
    peer.send("cp command 1 6 status 0", &target).unwrap();
    peer.send(&encode(&Message::Command(Command::new(0, "status"))), &target)
        .unwrap();
    peer.send(
        &encode(&Message::CookieRequest),
        &LinkAddress::new(addr(COOKIE_PORT), ProtocolId::App),
    )
    .unwrap();

    for _ in 0..4 {
        assert!(server.serve_once(POLL).unwrap());
    }
    assert_eq!(peer.pending(), 0);
    assert!(server.sessions().is_empty());

    peer.send(&encode(&Message::CookieRequest), &target).unwrap();
    server.serve_once(POLL).unwrap();
    assert_eq!(peer.pending(), 1);
}

#[test]
fn test_serve_once_times_out_quietly() {
    let network = MemoryNetwork::new();
    let server = CookieServer::new(network.bind(addr(COOKIE_PORT)).unwrap(), &test_config())
        .unwrap();

    assert!(!server.serve_once(Duration::from_millis(20)).unwrap());
}

// =============================================================================
// Command Server Tests
// =============================================================================

#[test]
fn test_command_server_echoes_id_and_payload() {
    let network = MemoryNetwork::new();
    let server = CommandServer::new(
        network.bind(addr(COMMAND_PORT)).unwrap(),
        BuiltinHandler,
        &test_config(),
    )
    .unwrap();
    let peer = network.bind(addr(CLIENT_PORT)).unwrap();

    peer.send(
        &encode(&Message::Command(Command::new(41, "print \"hello\""))),
        &LinkAddress::cp(addr(COMMAND_PORT)),
    )
    .unwrap();
    server.serve_once(POLL).unwrap();

    let (message, _) = expect_message(&peer);
    assert_eq!(message, Message::CommandResponse(CommandResponse::new(41, true, "hello")));
}

#[test]
fn test_command_server_reports_handler_failure() {
    let network = MemoryNetwork::new();
    let handler = |_: &str| CommandOutcome::error("nope");
    let server = CommandServer::new(
        network.bind(addr(COMMAND_PORT)).unwrap(),
        handler,
        &test_config(),
    )
    .unwrap();
    let peer = network.bind(addr(CLIENT_PORT)).unwrap();

    peer.send(
        &encode(&Message::Command(Command::new(2, "status"))),
        &LinkAddress::cp(addr(COMMAND_PORT)),
    )
    .unwrap();
    server.serve_once(POLL).unwrap();

    assert_eq!(
        expect_message(&peer).0,
        Message::CommandResponse(CommandResponse::new(2, false, "nope"))
    );
}

#[test]
fn test_command_server_does_not_require_cookie() {
    // no cookie server exists at all; the command is still answered
    let network = MemoryNetwork::new();
    let server = CommandServer::new(
        network.bind(addr(COMMAND_PORT)).unwrap(),
        BuiltinHandler,
        &test_config(),
    )
    .unwrap();
    let peer = network.bind(addr(CLIENT_PORT)).unwrap();

    peer.send(
        &encode(&Message::Command(Command::new(0, "status"))),
        &LinkAddress::cp(addr(COMMAND_PORT)),
    )
    .unwrap();
    server.serve_once(POLL).unwrap();

    assert!(matches!(
        expect_message(&peer).0,
        Message::CommandResponse(CommandResponse { id: 0, success: true, .. })
    ));
}

#[test]
fn test_command_server_ignores_other_kinds_and_garbage() {
    let network = MemoryNetwork::new();
    let server = CommandServer::new(
        network.bind(addr(COMMAND_PORT)).unwrap(),
        BuiltinHandler,
        &test_config(),
    )
    .unwrap();
    let peer = network.bind(addr(CLIENT_PORT)).unwrap();
    let target = LinkAddress::cp(addr(COMMAND_PORT));

    peer.send(&encode(&Message::CookieRequest), &target).unwrap();
    peer.send(
        &encode(&Message::CommandResponse(CommandResponse::new(0, true, "x"))),
        &target,
    )
    .unwrap();
    peer.send("cp command 0 6 status 12345", &target).unwrap();

    for _ in 0..3 {
        server.serve_once(POLL).unwrap();
    }
    assert_eq!(peer.pending(), 0);
}

#[test]
fn test_command_server_replies_to_each_source() {
    let network = MemoryNetwork::new();
    let handler = |text: &str| CommandOutcome::ok(text.to_uppercase());
    let server = CommandServer::new(
        network.bind(addr(COMMAND_PORT)).unwrap(),
        handler,
        &test_config(),
    )
    .unwrap();
    let a = network.bind(addr(5001)).unwrap();
    let b = network.bind(addr(5002)).unwrap();
    let target = LinkAddress::cp(addr(COMMAND_PORT));

    a.send(&encode(&Message::Command(Command::new(0, "alpha"))), &target).unwrap();
    b.send(&encode(&Message::Command(Command::new(0, "beta"))), &target).unwrap();
    server.serve_once(POLL).unwrap();
    server.serve_once(POLL).unwrap();

    assert_eq!(
        expect_message(&a).0,
        Message::CommandResponse(CommandResponse::new(0, true, "ALPHA"))
    );
    assert_eq!(
        expect_message(&b).0,
        Message::CommandResponse(CommandResponse::new(0, true, "BETA"))
    );
}

#[test]
fn test_command_server_replaces_oversized_response() {
    let network = MemoryNetwork::new();
    let handler = |_: &str| CommandOutcome::ok("x".repeat(70_000));
    let server = CommandServer::new(
        network.bind(addr(COMMAND_PORT)).unwrap(),
        handler,
        &test_config(),
    )
    .unwrap();
    let peer = network.bind(addr(CLIENT_PORT)).unwrap();

    peer.send(
        &encode(&Message::Command(Command::new(9, "status"))),
        &LinkAddress::cp(addr(COMMAND_PORT)),
    )
    .unwrap();
    assert!(server.serve_once(POLL).unwrap());

    assert_eq!(
        expect_message(&peer).0,
        Message::CommandResponse(CommandResponse::new(9, false, RESPONSE_TOO_LARGE))
    );
}

#[test]
fn test_command_server_replaces_untransmittable_payload() {
    let network = MemoryNetwork::new();
    let handler = |_: &str| CommandOutcome::ok("a  b");
    let server = CommandServer::new(
        network.bind(addr(COMMAND_PORT)).unwrap(),
        handler,
        &test_config(),
    )
    .unwrap();
    let peer = network.bind(addr(CLIENT_PORT)).unwrap();

    peer.send(
        &encode(&Message::Command(Command::new(3, "status"))),
        &LinkAddress::cp(addr(COMMAND_PORT)),
    )
    .unwrap();
    assert!(server.serve_once(POLL).unwrap());

    assert_eq!(
        expect_message(&peer).0,
        Message::CommandResponse(CommandResponse::new(3, false, PAYLOAD_NOT_TRANSMITTABLE))
    );
}

#[test]
fn test_command_server_keeps_running_after_oversized_response() {
    let network = MemoryNetwork::new();
    let _cookie_server = spawn_cookie_server(&network, default_sessions());
    let handler = |text: &str| match text {
        "big" => CommandOutcome::ok("x".repeat(70_000)),
        other => CommandOutcome::ok(other),
    };
    let _command_server = spawn_command_server(&network, handler);

    let mut client =
        Client::new(network.bind(addr(CLIENT_PORT)).unwrap(), &test_config()).unwrap();
    assert!(client.execute("big").is_err());
    assert_eq!(client.execute("small").unwrap().payload, "small");
}
