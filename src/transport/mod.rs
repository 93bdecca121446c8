//! Transport Module
//!
//! The virtual link CP runs on top of.
//!
//! ## Contract
//! - `send(payload, destination)` hands one opaque text frame to the link
//! - `receive(timeout)` blocks for at most `timeout` and yields either one
//!   datagram or `None`
//!
//! Each datagram records the protocol identifier it was addressed to, so CP
//! can skip unrelated traffic sharing the same link.
//!
//! ## Implementations
//! - [`UdpLink`]: `phy <protocol> <payload>` frames over a UDP socket
//! - [`MemoryLink`]: in-process fabric, used by tests and local demos

mod udp;
mod memory;

pub use udp::{UdpLink, MAX_DATAGRAM_SIZE, MAX_PAYLOAD_SIZE, PHY_HEADER};
pub use memory::{MemoryLink, MemoryNetwork};

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CpError, Result};

/// Protocol identifier carried by every link frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolId {
    Cp,
    App,
}

impl ProtocolId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolId::Cp => "cp",
            ProtocolId::App => "app",
        }
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolId {
    type Err = CpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cp" => Ok(ProtocolId::Cp),
            "app" => Ok(ProtocolId::App),
            other => Err(CpError::Transport(format!("unknown protocol id {:?}", other))),
        }
    }
}

/// A peer endpoint on the link, qualified by protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkAddress {
    pub socket: SocketAddr,
    pub protocol: ProtocolId,
}

impl LinkAddress {
    pub fn new(socket: SocketAddr, protocol: ProtocolId) -> Self {
        Self { socket, protocol }
    }

    /// A CP endpoint
    pub fn cp(socket: SocketAddr) -> Self {
        Self::new(socket, ProtocolId::Cp)
    }
}

impl fmt::Display for LinkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.socket, self.protocol)
    }
}

/// One received frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Frame text, link header removed
    pub payload: String,

    /// Sender, with the protocol the frame was addressed to
    pub source: LinkAddress,
}

impl Datagram {
    pub fn protocol(&self) -> ProtocolId {
        self.source.protocol
    }
}

/// Send/receive capability shared by every CP role
pub trait Transport {
    /// Send one frame to `destination`
    fn send(&self, payload: &str, destination: &LinkAddress) -> Result<()>;

    /// Wait up to `timeout` for one frame; `Ok(None)` on timeout
    fn receive(&self, timeout: Duration) -> Result<Option<Datagram>>;

    /// Address this endpoint is bound to
    fn local_addr(&self) -> SocketAddr;
}
