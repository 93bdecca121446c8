//! UDP virtual link
//!
//! Wraps a blocking `UdpSocket`. Each datagram is framed as
//! `phy <protocol> <payload>`.

use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::Result;
use super::{Datagram, LinkAddress, ProtocolId, Transport};

/// Link-layer header
pub const PHY_HEADER: &str = "phy";

/// Largest UDP payload over IPv4
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Largest payload that fits a datagram once the link header is added
///
/// The header is `phy <protocol> `; `app` is the longest protocol id.
pub const MAX_PAYLOAD_SIZE: usize = MAX_DATAGRAM_SIZE - "phy app ".len();

/// Virtual link endpoint over UDP
pub struct UdpLink {
    socket: UdpSocket,
    local_addr: SocketAddr,
    /// Receive buffer, reused across calls
    buf: Mutex<Vec<u8>>,
}

impl UdpLink {
    /// Bind a link endpoint
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        let local_addr = socket.local_addr()?;
        tracing::debug!("Virtual link bound to {}", local_addr);
        Ok(Self {
            socket,
            local_addr,
            buf: Mutex::new(vec![0u8; MAX_DATAGRAM_SIZE]),
        })
    }

    /// Build the link frame for `payload`
    fn frame(payload: &str, protocol: ProtocolId) -> String {
        format!("{} {} {}", PHY_HEADER, protocol, payload)
    }

    /// Split a link frame into protocol and payload
    fn unframe(bytes: &[u8]) -> Option<(ProtocolId, String)> {
        let text = std::str::from_utf8(bytes).ok()?;
        let mut parts = text.splitn(3, ' ');
        if parts.next()? != PHY_HEADER {
            return None;
        }
        let protocol = parts.next()?.parse::<ProtocolId>().ok()?;
        let payload = parts.next()?.trim_end_matches(['\r', '\n']);
        Some((protocol, payload.to_string()))
    }
}

impl Transport for UdpLink {
    fn send(&self, payload: &str, destination: &LinkAddress) -> Result<()> {
        let frame = Self::frame(payload, destination.protocol);
        tracing::trace!("-> {}: {}", destination, frame);
        self.socket.send_to(frame.as_bytes(), destination.socket)?;
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> Result<Option<Datagram>> {
        let deadline = Instant::now() + timeout;
        let mut buf = self.buf.lock();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            // a zero read timeout is rejected by the OS, so the zero case returns above
            self.socket.set_read_timeout(Some(remaining))?;

            match self.socket.recv_from(&mut buf) {
                Ok((len, from)) => match Self::unframe(&buf[..len]) {
                    Some((protocol, payload)) => {
                        tracing::trace!("<- {}/{}: {}", from, protocol, payload);
                        return Ok(Some(Datagram {
                            payload,
                            source: LinkAddress::new(from, protocol),
                        }));
                    }
                    None => {
                        tracing::debug!("Dropping malformed link frame from {}", from);
                    }
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    return Ok(None);
                }
                Err(e) if e.kind() == ErrorKind::ConnectionReset => {
                    // ICMP port unreachable from an earlier send (Windows)
                    tracing::debug!("Ignoring connection reset on {}", self.local_addr);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
