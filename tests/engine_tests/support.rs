//! Shared fixtures for engine tests

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cproto::protocol::{decode, Message};
use cproto::session::SessionTable;
use cproto::transport::{MemoryLink, MemoryNetwork};
use cproto::{CommandHandler, CommandServer, Config, CookieServer, Transport};

pub const CLIENT_PORT: u16 = 5000;
pub const COMMAND_PORT: u16 = 2000;
pub const COOKIE_PORT: u16 = 3000;

pub fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Short timeouts keep the retry tests fast
pub fn test_config() -> Config {
    Config::builder()
        .command_server_addr(addr(COMMAND_PORT))
        .cookie_server_addr(addr(COOKIE_PORT))
        .receive_timeout_ms(100)
        .max_attempts(3)
        .build()
}

/// Receive one frame on a scripted peer and decode it
pub fn expect_message(link: &MemoryLink) -> (Message, cproto::LinkAddress) {
    let datagram = link
        .receive(Duration::from_secs(2))
        .unwrap()
        .expect("expected a frame");
    (decode(&datagram.payload).unwrap(), datagram.source)
}

/// A server running on its own thread until dropped
pub struct Running {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap();
        }
    }
}

pub fn spawn_cookie_server(network: &MemoryNetwork, sessions: Arc<SessionTable>) -> Running {
    let link = network.bind(addr(COOKIE_PORT)).unwrap();
    let server = CookieServer::with_sessions(link, sessions, &test_config());
    let shutdown = server.shutdown_handle();
    let handle = thread::spawn(move || server.run().unwrap());
    Running {
        shutdown,
        handle: Some(handle),
    }
}

pub fn spawn_command_server<H>(network: &MemoryNetwork, handler: H) -> Running
where
    H: CommandHandler + Send + 'static,
{
    let link = network.bind(addr(COMMAND_PORT)).unwrap();
    let server = CommandServer::new(link, handler, &test_config()).unwrap();
    let shutdown = server.shutdown_handle();
    let handle = thread::spawn(move || server.run().unwrap());
    Running {
        shutdown,
        handle: Some(handle),
    }
}

pub fn default_sessions() -> Arc<SessionTable> {
    Arc::new(SessionTable::new(20, 1_000_000))
}
